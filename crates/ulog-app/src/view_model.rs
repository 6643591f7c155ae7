//! View-model lifecycle
//!
//! A view-model owns observer registrations on the shared [`AppState`] (and
//! possibly other observed records such as the config). Registrations are
//! made once through [`ViewModel::set_observers`] and dropped together by
//! [`ViewModel::teardown`].

use std::cell::RefCell;
use std::rc::Rc;

use ulog_core::prelude::*;
use ulog_core::ObserverId;

use crate::state::AppState;

/// State shared by every view-model: the application state and the
/// registrations this view-model made.
#[derive(Debug)]
pub struct ViewModelBase {
    state: AppState,
    observers: RefCell<Option<Vec<ObserverId>>>,
}

impl ViewModelBase {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            observers: RefCell::new(None),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// True between `set_observers` and `teardown`
    pub fn is_observing(&self) -> bool {
        self.observers.borrow().is_some()
    }

    fn attach(&self, ids: Vec<ObserverId>) {
        *self.observers.borrow_mut() = Some(ids);
    }

    /// Remove every registration at once. Idempotent.
    pub fn teardown(&self) {
        let Some(ids) = self.observers.borrow_mut().take() else {
            return;
        };
        let notifier = self.state.notifier();
        for id in &ids {
            notifier.unobserve(*id);
        }
        debug!("Tore down {} observer registrations", ids.len());
    }
}

/// Lifecycle contract of a view-model.
pub trait ViewModel: 'static {
    fn base(&self) -> &ViewModelBase;

    /// Register this view-model's reactions and return their handles.
    ///
    /// Implementations capture `Weak<Self>` in callbacks so a dropped
    /// view-model never keeps itself alive through its registrations.
    fn register_observers(self: &Rc<Self>) -> Vec<ObserverId>;

    fn state(&self) -> &AppState {
        self.base().state()
    }

    /// Start reacting to state changes.
    ///
    /// Runs once per active lifetime; a second call before [`teardown`]
    /// registers nothing.
    ///
    /// [`teardown`]: ViewModel::teardown
    fn set_observers(self: &Rc<Self>)
    where
        Self: Sized,
    {
        if self.base().is_observing() {
            warn!("set_observers() called twice without teardown(), ignoring");
            return;
        }
        let ids = self.register_observers();
        trace!("Registered {} observers", ids.len());
        self.base().attach(ids);
    }

    /// Stop reacting to state changes.
    fn teardown(&self) {
        self.base().teardown();
    }
}
