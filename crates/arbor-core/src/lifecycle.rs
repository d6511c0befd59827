use std::fmt;
use std::rc::Rc;

use crate::widget::WidgetCore;

/// Where a widget is in its life.
///
/// Per render cycle the order is `Created -> Mounted -> Rendered -> Draw`,
/// then `Rendered -> Draw` again on every update. `Unmounted` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum WidgetState {
    #[default]
    Created,
    Mounted,
    Rendered,
    Draw,
    Unmounted,
}

impl WidgetState {
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetState::Created => "created",
            WidgetState::Mounted => "mounted",
            WidgetState::Rendered => "rendered",
            WidgetState::Draw => "draw",
            WidgetState::Unmounted => "unmounted",
        }
    }
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle points user callbacks can attach to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Once, on the way out of `Created`.
    Load,
    Mount,
    Render,
    /// Only when `draw()` actually runs.
    Draw,
    Unmount,
}

pub type LifecycleAction = Rc<dyn Fn(&WidgetCore)>;

#[derive(Default)]
pub struct LifeCycle {
    on_load: Vec<LifecycleAction>,
    on_mount: Vec<LifecycleAction>,
    on_render: Vec<LifecycleAction>,
    on_draw: Vec<LifecycleAction>,
    on_unmount: Vec<LifecycleAction>,
}

impl LifeCycle {
    fn list_mut(&mut self, stage: Stage) -> &mut Vec<LifecycleAction> {
        match stage {
            Stage::Load => &mut self.on_load,
            Stage::Mount => &mut self.on_mount,
            Stage::Render => &mut self.on_render,
            Stage::Draw => &mut self.on_draw,
            Stage::Unmount => &mut self.on_unmount,
        }
    }

    pub fn push(&mut self, stage: Stage, action: LifecycleAction) {
        self.list_mut(stage).push(action);
    }

    pub fn actions(&self, stage: Stage) -> &[LifecycleAction] {
        match stage {
            Stage::Load => &self.on_load,
            Stage::Mount => &self.on_mount,
            Stage::Render => &self.on_render,
            Stage::Draw => &self.on_draw,
            Stage::Unmount => &self.on_unmount,
        }
    }
}
