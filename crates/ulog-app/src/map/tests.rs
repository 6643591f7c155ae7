use std::rc::Rc;

use ulog_core::prelude::*;
use ulog_core::Bounds;

use super::test_utils::{is_cleanup, is_display, is_zoom_to_bounds, position, Harness};
use super::*;
use crate::lang::Lang;

// ─────────────────────────────────────────────────────────────────────────────
// Backend loading
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_new_view_model_has_no_backend() {
    let h = Harness::new();
    assert!(h.vm.api().is_none());
    assert!(!h.vm.base().is_observing());
    assert!(h.vm.state().current_track().is_none());
}

#[test]
fn test_load_activates_backend_and_runs_on_ready() {
    let h = Harness::new();
    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();

    let outcome = h.load("openlayers");

    assert!(outcome.is_ready());
    assert_eq!(h.vm.api_name().as_deref(), Some("openlayers"));
    assert_eq!(
        h.labels(),
        vec!["init(openlayers)", "display_track(openlayers, true)"]
    );
}

#[test]
fn test_failed_load_reverts_config_to_default() {
    let h = Harness::new();
    h.config.set_map_api("gmaps");
    h.run();
    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();
    h.script("gmaps").fail_next("script blocked");

    let outcome = h.load("gmaps");

    match outcome {
        LoadOutcome::Failed(Error::MapApiInit { api, message }) => {
            assert_eq!(api, "gmaps");
            assert_eq!(message, "script blocked");
        }
        other => panic!("expected init failure, got {:?}", other),
    }
    assert_eq!(h.config.map_api(), "openlayers");
    assert!(h.vm.api().is_none());
    assert_eq!(h.labels(), vec!["init(gmaps)"]);
}

#[test]
fn test_failed_load_reverts_config_to_active_backend() {
    let h = Harness::new();
    h.vm.set_observers();
    assert!(h.load("gmaps").is_ready());
    h.config.set_map_api("gmaps");
    h.run();
    h.log.clear();

    h.script("mock").fail_next("boom");
    h.config.set_map_api("mock");
    h.run();

    assert_eq!(h.config.map_api(), "gmaps");
    assert_eq!(h.vm.api_name().as_deref(), Some("gmaps"));
    // the revert asks for the active backend, which is a no-op
    assert_eq!(h.labels(), vec!["init(mock)"]);
}

#[test]
fn test_unknown_backend_fails_and_reverts() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("gmaps")));
    h.config.set_map_api("bing");
    h.run();

    let outcome = h.load("bing");

    assert!(matches!(
        outcome,
        LoadOutcome::Failed(Error::UnknownMapApi { ref name }) if name == "bing"
    ));
    assert_eq!(h.config.map_api(), "gmaps");
    assert!(h.log.is_empty());
}

#[test]
fn test_requesting_active_backend_is_unchanged() {
    let h = Harness::new();
    assert!(h.load("openlayers").is_ready());
    h.log.clear();

    let outcome = h.load("openlayers");

    assert!(matches!(outcome, LoadOutcome::Unchanged));
    assert!(h.log.is_empty());
}

#[test]
fn test_swap_saves_bounds_and_cleans_up_after_init() {
    let h = Harness::new();
    assert!(h.load("openlayers").is_ready());
    h.log.clear();

    let outcome = h.load("gmaps");

    assert!(outcome.is_ready());
    assert_eq!(h.vm.api_name().as_deref(), Some("gmaps"));
    assert_eq!(h.state.saved_bounds(), Some(recording::DEFAULT_VIEW));
    assert_eq!(
        h.labels(),
        vec![
            "init(gmaps)".to_string(),
            "get_bounds(openlayers)".to_string(),
            "cleanup(openlayers)".to_string(),
            format!(
                "zoom_to_bounds(gmaps, {:?})",
                recording::DEFAULT_VIEW.to_array()
            ),
        ]
    );
}

#[test]
fn test_old_backend_survives_until_new_init_resolves() {
    let h = Harness::new();
    assert!(h.load("openlayers").is_ready());
    h.log.clear();

    let tx = h.script("gmaps").defer_next();
    let slot = h.spawn_load("gmaps");
    h.run();

    assert!(slot.borrow().is_none());
    assert!(h.vm.is_loading());
    assert_eq!(h.vm.api_name().as_deref(), Some("openlayers"));
    assert_eq!(h.count(is_cleanup), 0);
    assert_eq!(h.labels(), vec!["init(gmaps)"]);

    tx.send(Ok(())).unwrap();
    h.run();

    assert!(slot.borrow().as_ref().is_some_and(LoadOutcome::is_ready));
    assert!(!h.vm.is_loading());
    assert_eq!(h.vm.api_name().as_deref(), Some("gmaps"));
    let labels = h.labels();
    assert_eq!(labels[1], "get_bounds(openlayers)");
    assert_eq!(labels[2], "cleanup(openlayers)");
    assert!(labels[3].starts_with("zoom_to_bounds(gmaps"));
}

#[test]
fn test_failed_swap_keeps_old_backend() {
    let h = Harness::new();
    assert!(h.load("openlayers").is_ready());
    h.log.clear();

    let tx = h.script("gmaps").defer_next();
    let slot = h.spawn_load("gmaps");
    h.run();
    tx.send(Err("timeout".to_string())).unwrap();
    h.run();

    assert!(slot.borrow().as_ref().is_some_and(LoadOutcome::is_failed));
    assert_eq!(h.vm.api_name().as_deref(), Some("openlayers"));
    assert_eq!(h.count(is_cleanup), 0);
    assert!(h.state.saved_bounds().is_none());
}

#[test]
fn test_newer_request_supersedes_slow_one() {
    let h = Harness::new();
    let tx = h.script("gmaps").defer_next();
    let slow = h.spawn_load("gmaps");
    h.run();

    assert!(h.load("openlayers").is_ready());
    assert_eq!(h.vm.api_name().as_deref(), Some("openlayers"));

    tx.send(Ok(())).unwrap();
    h.run();

    assert!(matches!(*slow.borrow(), Some(LoadOutcome::Superseded)));
    assert_eq!(h.vm.api_name().as_deref(), Some("openlayers"));
    // the stale backend initialized, so it is released right away
    assert_eq!(
        h.labels(),
        vec!["init(gmaps)", "init(openlayers)", "cleanup(gmaps)"]
    );
}

#[test]
fn test_last_request_wins_regardless_of_completion_order() {
    let h = Harness::new();
    let first = h.script("gmaps").defer_next();
    let second = h.script("mock").defer_next();
    let a = h.spawn_load("gmaps");
    let b = h.spawn_load("mock");
    h.run();

    second.send(Ok(())).unwrap();
    h.run();
    first.send(Ok(())).unwrap();
    h.run();

    assert!(matches!(*a.borrow(), Some(LoadOutcome::Superseded)));
    assert!(b.borrow().as_ref().is_some_and(LoadOutcome::is_ready));
    assert_eq!(h.vm.api_name().as_deref(), Some("mock"));
}

#[test]
fn test_stale_failure_does_not_touch_config() {
    let h = Harness::new();
    h.config.set_map_api("mock");
    h.run();

    let tx = h.script("gmaps").defer_next();
    let slow = h.spawn_load("gmaps");
    h.run();
    assert!(h.load("mock").is_ready());

    tx.send(Err("late failure".to_string())).unwrap();
    h.run();

    assert!(matches!(*slow.borrow(), Some(LoadOutcome::Superseded)));
    assert_eq!(h.config.map_api(), "mock");
    assert_eq!(h.vm.api_name().as_deref(), Some("mock"));
}

// ─────────────────────────────────────────────────────────────────────────────
// on_ready
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_on_ready_restores_saved_bounds_only() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.state
        .set_saved_bounds(Some(Bounds::from([1.0, 2.0, 3.0, 4.0])));
    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();

    h.vm.on_ready();

    assert_eq!(h.labels(), vec!["zoom_to_bounds(mock, [1.0, 2.0, 3.0, 4.0])"]);
    assert_eq!(h.count(is_zoom_to_bounds), 1);
    assert_eq!(h.count(is_display(true)) + h.count(is_display(false)), 0);
}

#[test]
fn test_on_ready_draws_current_track() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();

    h.vm.on_ready();

    assert_eq!(h.count(is_display(true)), 1);
    assert_eq!(h.count(is_zoom_to_bounds), 0);
    match &h.log.snapshot()[0] {
        MapCommand::DisplayTrack {
            track_id,
            positions,
            ..
        } => {
            assert_eq!(*track_id, 1);
            assert_eq!(*positions, 3);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_on_ready_without_bounds_or_track_does_nothing() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));

    h.vm.on_ready();
    assert!(h.log.is_empty());
}

#[test]
fn test_on_ready_without_backend_does_nothing() {
    let h = Harness::new();
    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();

    h.vm.on_ready();
    assert!(h.log.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Reactions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_replaced_track_is_redrawn() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.vm.set_observers();

    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();

    assert_eq!(
        h.labels(),
        vec!["clear_map(mock)", "display_track(mock, true)"]
    );
}

#[test]
fn test_cleared_track_only_clears_map() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.notifier
        .set_silently(h.state.target(), "currentTrack", h.track(1, 3));
    h.vm.set_observers();

    h.state.set_current_track(None);
    h.run();

    assert_eq!(h.labels(), vec!["clear_map(mock)"]);
}

#[test]
fn test_live_append_updates_incrementally() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.vm.set_observers();
    let track = h.track(1, 3);
    h.state.set_current_track(Some(track.clone()));
    h.run();
    h.log.clear();

    track.push(position(4));
    h.run();

    assert_eq!(
        h.labels(),
        vec!["zoom_to_extent(mock)", "display_track(mock, false)"]
    );
    assert_eq!(h.count(is_display(true)), 0);
}

#[test]
fn test_append_burst_is_one_redraw() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.vm.set_observers();
    let track = h.track(1, 1);
    h.state.set_current_track(Some(track.clone()));
    h.run();
    h.log.clear();

    track.push(position(2));
    track.push(position(3));
    track.extend([position(4), position(5)]);
    h.run();

    assert_eq!(h.count(is_display(false)), 1);
    match h.log.snapshot().last() {
        Some(MapCommand::DisplayTrack { positions, .. }) => assert_eq!(*positions, 4),
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_replacement_absorbs_appends_in_same_turn() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.vm.set_observers();

    let track = h.track(1, 2);
    h.state.set_current_track(Some(track.clone()));
    track.push(position(3));
    h.run();

    assert_eq!(
        h.labels(),
        vec!["clear_map(mock)", "display_track(mock, true)"]
    );
}

#[test]
fn test_track_swapped_out_and_back_is_redrawn() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.vm.set_observers();
    let first = h.track(1, 3);
    h.state.set_current_track(Some(first.clone()));
    h.run();
    h.log.clear();

    // the append lands while the track is detached from the state
    h.state.set_current_track(Some(h.track(2, 1)));
    first.push(position(4));
    h.state.set_current_track(Some(first.clone()));
    h.run();

    assert_eq!(first.len(), 4);
    assert_eq!(
        h.labels(),
        vec!["clear_map(mock)", "display_track(mock, true)"]
    );
    match h.log.snapshot().last() {
        Some(MapCommand::DisplayTrack { positions, .. }) => assert_eq!(*positions, 4),
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_reactions_wait_for_a_backend() {
    let h = Harness::new();
    h.vm.set_observers();

    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();
    assert!(h.log.is_empty());
}

#[test]
fn test_config_change_loads_backend() {
    let h = Harness::new();
    h.vm.set_observers();
    assert!(h.load("openlayers").is_ready());
    h.log.clear();

    h.config.set_map_api("gmaps");
    h.run();

    assert_eq!(h.vm.api_name().as_deref(), Some("gmaps"));
    assert_eq!(h.labels()[0], "init(gmaps)");
    assert_eq!(h.count(is_cleanup), 1);
}

#[test]
fn test_config_change_to_unknown_backend_reverts() {
    let h = Harness::new();
    h.vm.set_observers();
    assert!(h.load("openlayers").is_ready());

    h.config.set_map_api("newapi");
    h.run();

    assert_eq!(h.config.map_api(), "openlayers");
    assert_eq!(h.vm.api_name().as_deref(), Some("openlayers"));
}

#[test]
fn test_teardown_stops_reactions() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.vm.set_observers();
    h.vm.teardown();

    h.state.set_current_track(Some(h.track(1, 3)));
    h.config.set_map_api("gmaps");
    h.run();

    assert!(h.log.is_empty());
    assert_eq!(h.vm.api_name().as_deref(), Some("mock"));
}

#[test]
fn test_set_observers_twice_reacts_once() {
    let h = Harness::new();
    h.vm.set_api(Some(h.backend("mock")));
    h.vm.set_observers();
    h.vm.set_observers();

    h.state.set_current_track(Some(h.track(1, 3)));
    h.run();

    assert_eq!(h.count(is_display(true)), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Presentation
// ─────────────────────────────────────────────────────────────────────────────

fn popup_harness(len: usize) -> Harness {
    let h = Harness::new();
    h.state.set_current_track(Some(h.track(1, len)));
    h.run();
    h
}

#[test]
fn test_popup_markup() {
    let h = popup_harness(3);

    let html = h.vm.get_popup_html(0).unwrap();

    assert!(html.starts_with(r#"<div id="popup">"#));
    assert!(html.contains(r#"<div id="pheader">"#));
    assert!(html.contains("alice"));
    assert!(html.contains("morning"));
    assert!(html.contains(r#"<div id="pright">"#));
    assert!(html.contains("Point 1 of 3"));
}

#[test]
fn test_popup_keeps_stats_for_latest_without_show_latest() {
    let h = popup_harness(3);

    let html = h.vm.get_popup_html(2).unwrap();

    assert!(html.contains(r#"id="pright""#));
    assert!(html.contains("Point 3 of 3"));
}

#[test]
fn test_popup_omits_stats_for_latest_with_show_latest() {
    let h = popup_harness(3);
    h.state.set_show_latest(true);

    let latest = h.vm.get_popup_html(2).unwrap();
    assert!(!latest.contains(r#"id="pright""#));

    let earlier = h.vm.get_popup_html(1).unwrap();
    assert!(earlier.contains(r#"id="pright""#));
}

#[test]
fn test_popup_escapes_comment() {
    let h = Harness::new();
    let track = h.track(1, 1);
    let mut p = position(2);
    p.comment = Some("<b>hi</b>".to_string());
    track.push(p);
    h.state.set_current_track(Some(track));
    h.run();

    let html = h.vm.get_popup_html(1).unwrap();
    assert!(html.contains(r#"<div id="pcomments">&lt;b&gt;hi&lt;/b&gt;</div>"#));
}

#[test]
fn test_popup_out_of_range() {
    let h = popup_harness(2);

    let err = h.vm.get_popup_html(2).unwrap_err();
    assert!(matches!(err, Error::PositionNotFound { index: 2, len: 2 }));
}

#[test]
fn test_popup_without_track() {
    let h = Harness::new();
    assert!(matches!(
        h.vm.get_popup_html(0),
        Err(Error::NoCurrentTrack)
    ));
}

#[test]
fn test_popup_missing_string_propagates() {
    let h = Harness::new();
    let lang = Rc::new(Lang::new(h.config.clone(), Default::default()));
    let vm = MapViewModel::new(
        h.state.clone(),
        h.config.clone(),
        lang,
        Rc::new(MapApiRegistry::new()),
    );
    h.state.set_current_track(Some(h.track(1, 2)));
    h.run();

    assert!(matches!(
        vm.get_popup_html(0),
        Err(Error::UnknownString { .. })
    ));
}

#[test]
fn test_svg_src_and_marker_style() {
    let h = popup_harness(3);

    let src = MapViewModel::get_svg_src("#ff0000", true, false);
    assert!(src.starts_with(markers::SVG_DATA_PREFIX));
    assert!(src.contains("%23ff0000"));

    let colors = h.config.colors();
    let start = h.vm.marker_style(0).unwrap();
    assert_eq!(start.kind, MarkerKind::Start);
    assert_eq!(start.fill, colors.start);
    assert_eq!(h.vm.marker_style(2).unwrap().kind, MarkerKind::Stop);
    assert!(h.vm.marker_style(3).is_none());
}

#[test]
fn test_dropped_load_is_not_in_flight() {
    let h = Harness::new();
    let load = h.vm.load_map_api("gmaps");
    assert!(h.vm.is_loading());

    drop(load);
    assert!(!h.vm.is_loading());
    assert!(h.vm.api().is_none());
}
