//! Widget class registry.
//!
//! Maps class names to the capabilities a node of that class gets when
//! instantiated: layout kind, composite flag, drop semantics and custom
//! layout hook. Project classes are registered on top of a built-in base
//! class and are always opaque composites.

use crate::id::NodeId;
use crate::layout::CustomLayout;
use crate::model::*;
use kurbo::Size;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub caps: WidgetCaps,
    pub default_size: Size,
    pub default_props: BTreeMap<String, Value>,
}

impl ClassInfo {
    fn new(caps: WidgetCaps) -> Self {
        Self {
            caps,
            default_size: Size::new(100.0, 100.0),
            default_props: BTreeMap::new(),
        }
    }

    fn with_prop(mut self, name: &str, value: Value) -> Self {
        self.default_props.insert(name.to_string(), value);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassInfo>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the stock widget set.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();

        for leaf in ["Widget", "Image", "Slider", "Switch", "CheckBox", "ProgressBar"] {
            reg.register(leaf, ClassInfo::new(WidgetCaps::leaf()));
        }
        for text in ["Button", "Label", "TextInput", "ToggleButton"] {
            reg.register(
                text,
                ClassInfo::new(WidgetCaps::leaf()).with_prop("text", Value::String(text.into())),
            );
        }

        for float in ["FloatLayout", "RelativeLayout", "Screen", "TabbedPanelItem"] {
            reg.register(float, ClassInfo::new(WidgetCaps::container(LayoutKind::Float)));
        }
        reg.register(
            "BoxLayout",
            ClassInfo::new(WidgetCaps::container(LayoutKind::Box(
                Orientation::Horizontal,
            ))),
        );
        reg.register(
            "GridLayout",
            ClassInfo::new(WidgetCaps::container(LayoutKind::Grid {
                rows: None,
                cols: Some(2),
            })),
        );
        reg.register(
            "AnchorLayout",
            ClassInfo::new(WidgetCaps::container(LayoutKind::Anchor)),
        );
        reg.register(
            "ScreenManager",
            ClassInfo::new(WidgetCaps::container(LayoutKind::ScreenManager {
                current: None,
            })),
        );
        reg.register(
            "Carousel",
            ClassInfo::new(WidgetCaps::container(LayoutKind::Carousel { index: 0 })),
        );
        reg.register(
            "TabbedPanel",
            ClassInfo::new(WidgetCaps {
                composite: Some(Composite::Complex),
                ..WidgetCaps::container(LayoutKind::Tabbed { current: 0 })
            }),
        );

        for chooser in ["FileChooserListView", "FileChooserIconView"] {
            reg.register(
                chooser,
                ClassInfo::new(WidgetCaps {
                    composite: Some(Composite::Complex),
                    accepts_drops: false,
                    ..WidgetCaps::leaf()
                }),
            );
        }
        for complex in ["Spinner", "VideoPlayer", "Accordion"] {
            reg.register(
                complex,
                ClassInfo::new(WidgetCaps {
                    composite: Some(Composite::Complex),
                    ..WidgetCaps::leaf()
                }),
            );
        }

        reg.register(
            "Sandbox",
            ClassInfo::new(WidgetCaps::container(LayoutKind::Sandbox)),
        );
        reg.register(
            "DragGhost",
            ClassInfo::new(WidgetCaps::container(LayoutKind::Ghost)),
        );
        reg
    }

    pub fn register(&mut self, class: &str, info: ClassInfo) {
        self.classes.insert(class.to_string(), info);
    }

    /// Register a project class deriving from `base`. Returns `false` if
    /// `base` is unknown.
    pub fn register_custom(
        &mut self,
        class: &str,
        base: &str,
        hook: Option<Arc<dyn CustomLayout>>,
    ) -> bool {
        let Some(base) = self.classes.get(base) else {
            log::warn!("custom class `{class}` derives from unknown `{base}`");
            return false;
        };
        let mut info = base.clone();
        info.caps.composite = Some(Composite::Custom);
        if hook.is_some() {
            info.caps.hook = hook;
        }
        self.classes.insert(class.to_string(), info);
        true
    }

    pub fn get(&self, class: &str) -> Option<&ClassInfo> {
        self.classes.get(class)
    }

    pub fn is_custom(&self, class: &str) -> bool {
        self.get(class)
            .is_some_and(|c| c.caps.composite == Some(Composite::Custom))
    }

    pub fn is_complex(&self, class: &str) -> bool {
        self.get(class)
            .is_some_and(|c| c.caps.composite == Some(Composite::Complex))
    }

    /// Build a detached node of `class` with a fresh id.
    pub fn instantiate(&self, class: &str) -> Option<WidgetNode> {
        let info = self.get(class)?;
        let mut node = WidgetNode::new(NodeId::for_class(class), class, info.caps.clone());
        node.geometry.size = info.default_size;
        node.props = info.default_props.clone();
        Some(node)
    }
}
