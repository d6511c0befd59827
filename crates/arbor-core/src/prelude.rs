pub use crate::basic::{Empty, Group, empty, group};
pub use crate::conditional::{Conditional, When, conditional, when};
pub use crate::configurable::{Configurable, Configuration};
pub use crate::deferred::{Deferred, defer};
pub use crate::effects::{Dispose, on_unmount};
pub use crate::element::{Element, Node};
pub use crate::error::{Error, Result};
pub use crate::event::{Event, event};
pub use crate::hooked::{Hooked, hooked};
pub use crate::locals::Locals;
pub use crate::memo::Observable;
pub use crate::optional::{Closable, Optional, optional};
pub use crate::property::Property;
pub use crate::runtime::{Runtime, RuntimeOptions};
pub use crate::widget::{
    Drawable, HasConfiguration, HasLifecycle, Widget, WidgetCore, WidgetExt, WidgetRef,
};
