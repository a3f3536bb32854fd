//! Per-frame update scheduling.
//!
//! The scheduler is an ordered list of [`UpdateTask`]s. Each frame every task
//! runs once before anything is drawn: behaviors and components first, in
//! registration order, then the dynamic buffer syncs. Tasks name their
//! target by id instead of capturing it, so removing an instance or object only
//! has to drop the matching entries.

use crate::{
    data_structures::{instance::InstanceId, object::ObjectId},
    gpu::GpuBackend,
    input::InputState,
    physics::TileGrid,
    registry::ObjectRegistry,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateTask {
    /// The instance's own behavior.
    Instance {
        object: ObjectId,
        instance: InstanceId,
    },
    /// The `component`-th component attached to an instance.
    Component {
        object: ObjectId,
        instance: InstanceId,
        component: usize,
    },
    /// Full re-upload of a dynamic attribute buffer.
    SyncBuffer { object: ObjectId, attribute: usize },
}

impl UpdateTask {
    pub fn object(&self) -> ObjectId {
        match *self {
            UpdateTask::Instance { object, .. }
            | UpdateTask::Component { object, .. }
            | UpdateTask::SyncBuffer { object, .. } => object,
        }
    }

    pub fn instance(&self) -> Option<InstanceId> {
        match *self {
            UpdateTask::Instance { instance, .. } | UpdateTask::Component { instance, .. } => {
                Some(instance)
            }
            UpdateTask::SyncBuffer { .. } => None,
        }
    }
}

/// Something an update wants the game to react to after the update pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    Died {
        object: ObjectId,
        instance: InstanceId,
    },
    Won {
        object: ObjectId,
        instance: InstanceId,
    },
}

/// Read-only frame inputs plus the event outbox handed to every update.
pub struct FrameContext<'a> {
    pub delta_time: f32,
    pub elapsed: f64,
    pub input: &'a InputState,
    pub grid: Option<&'a TileGrid>,
    events: Vec<FrameEvent>,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        delta_time: f32,
        elapsed: f64,
        input: &'a InputState,
        grid: Option<&'a TileGrid>,
    ) -> Self {
        Self {
            delta_time,
            elapsed,
            input,
            grid,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: FrameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[FrameEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<FrameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<UpdateTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_update(&mut self, task: UpdateTask) {
        self.tasks.push(task);
    }

    /// Removes the first registration equal to `task`.
    pub fn pop_update(&mut self, task: &UpdateTask) -> bool {
        match self.tasks.iter().position(|t| t == task) {
            Some(index) => {
                self.tasks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Unregisters every update of one instance. Returns how many were removed.
    pub fn pop_instance(&mut self, object: ObjectId, instance: InstanceId) -> usize {
        let matching: Vec<UpdateTask> = self
            .tasks
            .iter()
            .filter(|t| t.object() == object && t.instance() == Some(instance))
            .copied()
            .collect();
        let mut removed = 0;
        for task in &matching {
            if self.pop_update(task) {
                removed += 1;
            }
        }
        removed
    }

    /// Unregisters every update that targets `object`.
    pub fn pop_object(&mut self, object: ObjectId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.object() != object);
        before - self.tasks.len()
    }

    pub fn tasks(&self) -> &[UpdateTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs every registered task once. Instance and component updates run in
    /// registration order, then every buffer sync, so uploads always see this
    /// frame's writes. Returns how many tasks found a target.
    pub fn run(
        &self,
        registry: &mut ObjectRegistry,
        gpu: &mut dyn GpuBackend,
        frame: &mut FrameContext<'_>,
    ) -> usize {
        let (syncs, updates): (Vec<&UpdateTask>, Vec<&UpdateTask>) = self
            .tasks
            .iter()
            .partition(|task| matches!(task, UpdateTask::SyncBuffer { .. }));
        let mut ran = 0;
        for task in updates.into_iter().chain(syncs) {
            if registry.run_task(task, gpu, frame) {
                ran += 1;
            } else {
                log::trace!("skipped update {:?}: target is gone", task);
            }
        }
        ran
    }
}
