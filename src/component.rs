//! Behaviors attached to instances.
//!
//! A [`Component`] is a stateless descriptor shared between instances; whatever
//! state it needs lives on the instance ([`InstanceState`](crate::data_structures::instance::InstanceState)).
//! A [`Behavior`] is the instance's own lifecycle hook and may carry state.
//! Both receive the instance explicitly instead of capturing it.

use crate::{data_structures::instance::InstanceMut, scheduler::FrameContext};

pub trait Component {
    fn name(&self) -> &str;

    /// Runs once when the instance is created.
    fn init(&self, _instance: &mut InstanceMut<'_>) {}

    /// Runs once per frame, after the instance's own behavior.
    fn update(&self, _frame: &mut FrameContext<'_>, _instance: &mut InstanceMut<'_>) {}

    /// Components without per-frame work aren't scheduled.
    fn wants_update(&self) -> bool {
        true
    }
}

pub trait Behavior {
    fn init(&mut self, _instance: &mut InstanceMut<'_>) {}

    fn update(&mut self, _frame: &mut FrameContext<'_>, _instance: &mut InstanceMut<'_>) {}
}
