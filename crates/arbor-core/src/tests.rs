#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::*;

    #[derive(Clone)]
    struct Counter {
        core: WidgetCore,
        count: Property<u32>,
        draws: Rc<Cell<usize>>,
    }

    impl Counter {
        fn new() -> Self {
            let core = WidgetCore::managed_of::<Counter>();
            let count = core.configurable().property(0);
            Self {
                core,
                count,
                draws: Rc::default(),
            }
        }
    }

    impl Drawable for Counter {
        fn draw(&self) -> Result<Element> {
            self.draws.set(self.draws.get() + 1);
            let count = self.count.get().unwrap_or_default();
            Ok(Element::tag("span").child(Element::text(count.to_string())))
        }
    }

    impl Widget for Counter {
        fn core(&self) -> &WidgetCore {
            &self.core
        }
    }

    /// Unmanaged: redraws whenever it is expanded.
    #[derive(Clone)]
    struct Plain {
        core: WidgetCore,
        text: &'static str,
        draws: Rc<Cell<usize>>,
    }

    fn plain(text: &'static str) -> Plain {
        Plain {
            core: WidgetCore::of::<Plain>(),
            text,
            draws: Rc::default(),
        }
    }

    impl Drawable for Plain {
        fn draw(&self) -> Result<Element> {
            self.draws.set(self.draws.get() + 1);
            Ok(Element::text(self.text))
        }
    }

    impl Widget for Plain {
        fn core(&self) -> &WidgetCore {
            &self.core
        }
    }

    fn record(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> impl Fn(&WidgetCore) + use<> {
        let log = log.clone();
        move |_: &WidgetCore| log.borrow_mut().push(tag)
    }

    #[test]
    fn test_lifecycle_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let counter = Counter::new()
            .on_load(record(&log, "load"))
            .on_mount(record(&log, "mount"))
            .on_render(record(&log, "render"))
            .on_draw(record(&log, "draw"))
            .on_unmount(record(&log, "unmount"));
        let runtime = Runtime::new();
        let root = counter.render();

        assert_eq!(counter.state(), WidgetState::Created);
        runtime.frame(&root).unwrap();
        assert_eq!(*log.borrow(), ["load", "mount", "render", "draw"]);
        assert_eq!(counter.state(), WidgetState::Draw);

        log.borrow_mut().clear();
        runtime.frame(&root).unwrap();
        assert_eq!(*log.borrow(), ["render"]);
        assert_eq!(counter.state(), WidgetState::Rendered);

        log.borrow_mut().clear();
        counter.count.set(1);
        runtime.frame(&root).unwrap();
        assert_eq!(*log.borrow(), ["render", "draw"]);

        log.borrow_mut().clear();
        runtime.frame(&Element::Empty).unwrap();
        assert_eq!(*log.borrow(), ["unmount"]);
        assert_eq!(counter.state(), WidgetState::Unmounted);
    }

    #[test]
    fn test_managed_widget_draws_only_when_triggered() {
        let counter = Counter::new();
        let runtime = Runtime::new();
        let root = counter.render();

        for _ in 0..3 {
            runtime.frame(&root).unwrap();
        }
        assert_eq!(counter.draws.get(), 1);
        assert!(!runtime.needs_frame());

        counter.count.set(4);
        assert!(runtime.needs_frame());
        let node = runtime.frame(&root).unwrap();
        assert_eq!(counter.draws.get(), 2);
        assert_eq!(node.to_string(), "<span>4</span>");

        counter.count.set(4);
        assert!(!runtime.needs_frame());
    }

    #[test]
    fn test_unmanaged_widget_draws_every_pass() {
        let widget = plain("x");
        let runtime = Runtime::new();
        let root = widget.render();
        for _ in 0..3 {
            runtime.frame(&root).unwrap();
        }
        assert_eq!(widget.draws.get(), 3);
    }

    #[test]
    fn test_addons_render_regardless_of_parent_gating() {
        let counter = Counter::new();
        let addon = counter.add(plain("!"));
        let runtime = Runtime::new();
        let root = counter.render();

        for _ in 0..3 {
            let node = runtime.frame(&root).unwrap();
            assert_eq!(node.to_string(), "<span>0</span>!");
        }
        assert_eq!(counter.draws.get(), 1);
        assert_eq!(addon.draws.get(), 3);
        assert_eq!(runtime.mounted(), 2);
    }

    #[test]
    fn test_child_redraws_inside_cached_parent() {
        #[derive(Clone)]
        struct Panel {
            core: WidgetCore,
            child: Counter,
            draws: Rc<Cell<usize>>,
        }

        impl Drawable for Panel {
            fn draw(&self) -> Result<Element> {
                self.draws.set(self.draws.get() + 1);
                Ok(Element::tag("div").child(self.child.render()))
            }
        }

        impl Widget for Panel {
            fn core(&self) -> &WidgetCore {
                &self.core
            }
        }

        let panel = Panel {
            core: WidgetCore::managed_of::<Panel>(),
            child: Counter::new(),
            draws: Rc::default(),
        };
        let runtime = Runtime::new();
        let root = panel.render();

        let node = runtime.frame(&root).unwrap();
        insta::assert_snapshot!(node.to_string(), @"<div><span>0</span></div>");

        panel.child.count.set(9);
        let node = runtime.frame(&root).unwrap();
        insta::assert_snapshot!(node.to_string(), @"<div><span>9</span></div>");
        assert_eq!(panel.draws.get(), 1);
        assert_eq!(panel.child.draws.get(), 2);
    }

    #[test]
    fn test_unmounted_widget_is_inert() {
        let started = Rc::new(Cell::new(0));
        let stopped = Rc::new(Cell::new(0));
        let (s1, s2) = (started.clone(), stopped.clone());
        let counter = Counter::new().subscribe(move || {
            s1.set(s1.get() + 1);
            let s2 = s2.clone();
            on_unmount(move || s2.set(s2.get() + 1))
        });
        let runtime = Runtime::new();

        runtime.frame(&counter.render()).unwrap();
        runtime.frame(&counter.render()).unwrap();
        assert_eq!((started.get(), stopped.get()), (1, 0));

        runtime.unmount_all();
        assert_eq!((started.get(), stopped.get()), (1, 1));
        assert_eq!(runtime.mounted(), 0);
        assert_eq!(counter.state(), WidgetState::Unmounted);

        counter.count.set(10);
        assert!(!runtime.needs_frame());
        assert!(counter.core().configurable().trigger().is_some_and(|t| t.is_disposed()));
    }

    #[test]
    fn test_shared_configuration_rerenders_in_lockstep() {
        #[derive(Clone)]
        struct Mirror {
            core: WidgetCore,
            count: Property<u32>,
        }

        impl Drawable for Mirror {
            fn draw(&self) -> Result<Element> {
                let count = self.count.get().unwrap_or_default();
                Ok(Element::tag("i").child(Element::text(count.to_string())))
            }
        }

        impl Widget for Mirror {
            fn core(&self) -> &WidgetCore {
                &self.core
            }
        }

        let counter = Counter::new();
        let mirror = Mirror {
            core: WidgetCore::sharing::<Mirror>(counter.core().configurable()),
            count: counter.count.clone(),
        };
        let runtime = Runtime::new();
        let root = Element::fragment([counter.render(), mirror.render()]);

        runtime.frame(&root).unwrap();
        counter.count.set(3);
        let node = runtime.frame(&root).unwrap();
        assert_eq!(node.to_string(), "<span>3</span><i>3</i>");
    }

    #[test]
    fn test_contract_violation_aborts_frame() {
        #[derive(Clone)]
        struct Reader {
            core: WidgetCore,
            hook: Hook<u32>,
        }

        impl Drawable for Reader {
            fn draw(&self) -> Result<Element> {
                Ok(Element::text(self.hook.get()?.to_string()))
            }
        }

        impl Widget for Reader {
            fn core(&self) -> &WidgetCore {
                &self.core
            }
        }

        let counter = Counter::new();
        let stranger = Counter::new();
        let reader = Reader {
            core: WidgetCore::of::<Reader>(),
            hook: stranger.hook_value(|_: &Locals| 1u32),
        };
        let runtime = Runtime::new();
        runtime.frame(&counter.render()).unwrap();

        let root = Element::fragment([counter.render(), reader.render()]);
        assert_eq!(
            runtime.frame(&root).unwrap_err(),
            Error::HookNotEvaluated { index: 0 }
        );
        assert_ne!(counter.state(), WidgetState::Unmounted);
    }

    #[test]
    fn test_hooks_read_runtime_locals() {
        #[derive(Clone, PartialEq, Default)]
        struct Theme(&'static str);

        #[derive(Clone)]
        struct Themed {
            core: WidgetCore,
            theme: Hook<Theme>,
        }

        impl Drawable for Themed {
            fn draw(&self) -> Result<Element> {
                Ok(Element::text(self.theme.get()?.0))
            }
        }

        impl Widget for Themed {
            fn core(&self) -> &WidgetCore {
                &self.core
            }
        }

        let core = WidgetCore::of::<Themed>();
        let theme = core.hooks().hook_value(|l: &Locals| l.get_or_default::<Theme>());
        let themed = Themed { core, theme };
        let runtime = Runtime::new();
        runtime.provide(Theme("light"));
        let root = themed.render();

        assert_eq!(runtime.frame(&root).unwrap().text_content(), "light");
        runtime.provide(Theme("dark"));
        assert_eq!(runtime.frame(&root).unwrap().text_content(), "dark");
    }

    #[test]
    fn test_conditional_cache_keeps_identity_across_frames() {
        let key = Rc::new(Cell::new("a"));
        let k = key.clone();
        let cached = conditional(|| true).cache(|_: Option<&Counter>| Counter::new(), move || k.get());
        let runtime = Runtime::new();
        let root = cached.render();

        runtime.frame(&root).unwrap();
        let first = cached.get().unwrap();
        runtime.frame(&root).unwrap();
        assert!(first.core().ptr_eq(cached.get().unwrap().core()));
        assert_eq!(first.draws.get(), 1);

        key.set("b");
        runtime.frame(&root).unwrap();
        assert!(!first.core().ptr_eq(cached.get().unwrap().core()));
        assert_eq!(first.state(), WidgetState::Unmounted);
    }

    #[test]
    fn test_conditional_renders_stub_when_false() {
        let open = Rc::new(Cell::new(false));
        let o = open.clone();
        let branch = conditional(move || o.get())
            .persist(|| plain("body"))
            .otherwise(|| plain("stub"));
        let runtime = Runtime::new();
        let root = branch.render();

        assert_eq!(runtime.frame(&root).unwrap().text_content(), "stub");
        open.set(true);
        assert_eq!(runtime.frame(&root).unwrap().text_content(), "body");
        assert!(branch.is_true());
    }

    #[test]
    fn test_conditional_stub_survives_toggling() {
        let open = Rc::new(Cell::new(false));
        let o = open.clone();
        let branch = conditional(move || o.get())
            .persist(|| plain("body"))
            .otherwise(Counter::new);
        let runtime = Runtime::new();
        let root = branch.render();

        assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>0</span>");
        let first = branch.stub().unwrap();

        open.set(true);
        assert_eq!(runtime.frame(&root).unwrap().text_content(), "body");
        assert!(branch.stub().is_none());
        assert_eq!(first.state(), WidgetState::Unmounted);

        open.set(false);
        assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>0</span>");
        let second = branch.stub().unwrap();
        assert!(!first.ptr_eq(&second));
        assert_eq!(second.state(), WidgetState::Draw);

        open.set(true);
        runtime.frame(&root).unwrap();
        open.set(false);
        let node = runtime.frame(&root).unwrap();
        assert_eq!(node.to_string(), "<span>0</span>");
        assert_eq!(branch.stub().unwrap().state(), WidgetState::Draw);
    }

    #[test]
    fn test_conditional_stub_stays_reactive() {
        let stub = Counter::new();
        let shown = stub.clone();
        let branch: Conditional<Plain> = conditional(|| false).otherwise(move || shown.clone());
        let runtime = Runtime::new();
        let root = branch.render();

        runtime.frame(&root).unwrap();
        runtime.frame(&root).unwrap();
        assert_eq!(stub.draws.get(), 1);

        stub.count.set(5);
        assert!(runtime.needs_frame());
        assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>5</span>");
    }

    #[test]
    fn test_rekeyed_widget_stays_mounted() {
        let unmounts = Rc::new(Cell::new(0));
        let u = unmounts.clone();
        let counter = Counter::new().on_unmount(move |_: &WidgetCore| u.set(u.get() + 1));
        let runtime = Runtime::new();

        runtime.frame(&group().widget(counter.clone()).render()).unwrap();
        let root = group().widget(counter.clone().with_key("k")).render();
        assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>0</span>");
        assert_eq!(counter.state(), WidgetState::Rendered);
        assert_eq!(unmounts.get(), 0);
        assert_eq!(runtime.mounted(), 2);

        counter.count.set(3);
        assert!(runtime.needs_frame());
        assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>3</span>");
        assert_eq!(counter.draws.get(), 2);
    }

    #[test]
    fn test_widget_moved_between_parents_keeps_its_trigger() {
        let counter = Counter::new();
        let runtime = Runtime::new();

        runtime.frame(&group().widget(counter.clone()).render()).unwrap();
        let moved = group().widget(group().widget(counter.clone())).render();
        runtime.frame(&moved).unwrap();
        assert_ne!(counter.state(), WidgetState::Unmounted);

        counter.count.set(1);
        assert!(runtime.needs_frame());
        assert_eq!(runtime.frame(&moved).unwrap().to_string(), "<span>1</span>");
    }

    #[test]
    fn test_optional_spawn_destroy_spawn() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        let popup = optional(move |props: Option<&u32>| {
            c.borrow_mut().push(props.copied());
            Counter::new()
        });
        let runtime = Runtime::new();
        let root = popup.render();

        runtime.frame(&root).unwrap();
        assert!(popup.get().is_none());

        popup.spawn(1);
        assert!(runtime.needs_frame());
        runtime.frame(&root).unwrap();
        let first = popup.get().unwrap();
        assert_eq!(first.state(), WidgetState::Draw);

        popup.destroy();
        runtime.frame(&root).unwrap();
        assert!(popup.get().is_none());
        assert_eq!(first.state(), WidgetState::Unmounted);

        popup.spawn(2);
        runtime.frame(&root).unwrap();
        let second = popup.get().unwrap();
        assert!(!first.core().ptr_eq(second.core()));
        assert_eq!(*calls.borrow(), [Some(1), Some(2)]);
    }

    #[test]
    fn test_new_widget_under_same_key_replaces_old() {
        let a = plain("a").with_key("slot");
        let b = plain("b").with_key("slot");
        let runtime = Runtime::new();

        runtime.frame(&a.render()).unwrap();
        let node = runtime.frame(&b.render()).unwrap();
        assert_eq!(node.text_content(), "b");
        assert_eq!(a.state(), WidgetState::Unmounted);
        assert_eq!(runtime.mounted(), 1);
    }

    #[test]
    fn test_swapped_keys_keep_both_widgets() {
        let a = Counter::new().with_key("left");
        let b = Counter::new().with_key("right");
        let runtime = Runtime::new();
        let first = group().widgets([a.clone(), b.clone()]).with_key("row");
        runtime.frame(&first.render()).unwrap();

        let (a, b) = (a.with_key("right"), b.with_key("left"));
        let root = group().widgets([b.clone(), a.clone()]).with_key("row").render();
        runtime.frame(&root).unwrap();
        assert_eq!(first.state(), WidgetState::Unmounted);
        assert_eq!(a.state(), WidgetState::Rendered);
        assert_eq!(b.state(), WidgetState::Rendered);
        assert_eq!(runtime.mounted(), 3);

        a.count.set(2);
        assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>0</span><span>2</span>");
    }

    #[test]
    fn test_frame_requests_reach_host() {
        let requests = Rc::new(Cell::new(0));
        let r = requests.clone();
        let runtime =
            Runtime::with_options(RuntimeOptions::default().with_frame_request(move || r.set(r.get() + 1)));
        let counter = Counter::new();
        runtime.frame(&counter.render()).unwrap();

        counter.lock(|| {
            counter.count.set(1);
            counter.count.set(2);
        });
        assert_eq!(requests.get(), 1);
    }

    #[test]
    fn test_lifecycle_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
        let runtime = Runtime::with_options(RuntimeOptions::default().with_lifecycle_logs(true));
        let root = group().widget(plain("a")).widget(Counter::new()).render();
        let node = runtime.frame(&root).unwrap();
        assert_eq!(node.to_string(), "a<span>0</span>");
        assert_eq!(runtime.frame_count(), 1);
    }

    #[test]
    fn test_enter_debounce_runs_on_advance() {
        let runtime = Runtime::new();
        let submitted = Rc::new(Cell::new(0));
        let s = submitted.clone();
        let on_key = handle_enter(runtime.debouncer(), move || s.set(s.get() + 1));

        on_key("Enter");
        on_key("Enter");
        let now = runtime.timers().now();
        runtime.advance(now + runtime.options().enter_debounce);
        assert_eq!(submitted.get(), 1);
    }

    #[test]
    fn test_when_renders_matching_branches() {
        let mode = Rc::new(Cell::new(1));
        let (m1, m2) = (mode.clone(), mode.clone());
        let choice = when()
            .widget(move || m1.get() == 1, || plain("one"))
            .persist(move || m2.get() == 2, || plain("two"));
        let runtime = Runtime::new();
        let root = choice.render();

        assert_eq!(runtime.frame(&root).unwrap().text_content(), "one");
        mode.set(2);
        assert_eq!(runtime.frame(&root).unwrap().text_content(), "two");
        assert_eq!(choice.all().len(), 1);
    }
}
