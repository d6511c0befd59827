//! Per-widget render bridge.

use crate::element::Node;
use crate::error::Result;
use crate::lifecycle::{Stage, WidgetState};
use crate::runtime::{InstanceId, Runtime};
use crate::widget::{Drawable, Widget, WidgetRef};

/// Drives one widget through a single host render pass: hook evaluation,
/// lifecycle transitions, the gated `draw()`, then expansion of the drawn
/// element and the widget's addons.
pub(crate) struct WidgetRender<'a> {
    runtime: &'a Runtime,
    widget: &'a WidgetRef,
    instance: InstanceId,
    frame: u64,
}

impl<'a> WidgetRender<'a> {
    pub(crate) fn new(
        runtime: &'a Runtime,
        widget: &'a WidgetRef,
        parent: InstanceId,
        frame: u64,
    ) -> Self {
        Self {
            runtime,
            widget,
            instance: parent.child(&widget.core().key()),
            frame,
        }
    }

    pub(crate) fn render(self) -> Result<Node> {
        let core = self.widget.core();
        let logs = self.runtime.options().lifecycle_logs;

        if core.state() == WidgetState::Unmounted {
            log::warn!(
                "[{}]: rendered after unmount; drawing without state",
                core.name()
            );
            let element = self.widget.draw()?;
            return self.runtime.expand(&element, self.instance, self.frame);
        }

        core.hooks().evaluate(self.runtime.locals());

        let attached = self.runtime.attach(self.instance, self.widget, self.frame);
        if core.state() == WidgetState::Created {
            core.fire(Stage::Load);
        }
        if attached.fresh {
            if let Some(trigger) = self.runtime.trigger(attached.slot) {
                core.configurable().bind_trigger(trigger);
            }
            core.fire(Stage::Mount);
            core.transition(WidgetState::Mounted, logs);
            let disposers = core.start_subscriptions();
            self.runtime.store_disposers(attached.slot, disposers);
        }

        core.fire(Stage::Render);
        core.transition(WidgetState::Rendered, logs);

        let cached = if core.is_managed() && !self.widget.render_without_changes() {
            self.runtime.cached_draw(attached.slot)
        } else {
            None
        };
        let element = match cached {
            Some(element) => element,
            None => {
                let state = self.runtime.slot_state(attached.slot);
                core.fire(Stage::Draw);
                core.transition(WidgetState::Draw, logs);
                let element = self.widget.draw()?;
                self.runtime
                    .store_draw(attached.slot, state, element.clone());
                element
            }
        };

        let mut nodes = Vec::with_capacity(1 + core.addons().len());
        nodes.push(self.runtime.expand(&element, self.instance, self.frame)?);
        for addon in core.addons() {
            nodes.push(
                WidgetRender::new(self.runtime, &addon, self.instance, self.frame).render()?,
            );
        }
        Ok(Node::Fragment(nodes))
    }
}
