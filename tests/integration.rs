//! Integration tests for zeph.
//!
//! These drive the public API from outside the crate: the registry defines
//! components against a memory fetcher, and instances are created in the
//! harness document.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::task::LocalSet;
use tokio_test::{assert_pending, assert_ready_ok};

use zeph::context::ResourceOptions;
use zeph::event::Event;
use zeph::registry::events;
use zeph::testing::{Harness, MemoryFetcher};
use zeph::{Element, ListenerResult, ZephError};

fn literal() -> ResourceOptions {
    ResourceOptions::new().no_remote()
}

fn count_events(harness: &Harness, name: &str) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    harness.document().add_event_listener(name, move |_: &Event| {
        counter.set(counter.get() + 1);
        Ok(())
    });
    count
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn define_resolves_once_the_class_is_registered() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            let registry = harness.registry();
            let handle = registry.define("my-card", |def| def.html_with("<p></p>", literal()));

            assert!(registry.has("my-card"));
            assert!(!registry.get("my-card").unwrap().is_defined());
            assert!(!harness.document().is_element_defined("my-card"));

            let component = handle.await.unwrap();
            assert_eq!(component.name(), "my-card");
            assert!(component.element_class().is_some());
            assert!(harness.document().is_element_defined("my-card"));
            assert_eq!(registry.names(), vec!["my-card"]);
        })
        .await;
}

#[tokio::test]
async fn duplicate_attribute_rejects_the_definition() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            let err = harness
                .registry()
                .define("my-dup", |def| {
                    def.attribute("size", "s")?;
                    def.attribute("SIZE", "m")
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ZephError::DuplicateAttribute(name) if name == "size"));
            assert!(!harness.document().is_element_defined("my-dup"));
        })
        .await;
}

#[tokio::test]
async fn wait_for_before_and_after_define() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            let registry = harness.registry();
            let mut early = tokio_test::task::spawn(registry.wait_for("my-late"));
            assert_pending!(early.poll());

            registry.define("my-late", |_| Ok(())).await.unwrap();
            assert!(early.is_woken());
            assert_ready_ok!(early.poll());

            registry.wait_for("my-late").await.unwrap();
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn ready_fires_once_for_staggered_definitions() {
    LocalSet::new()
        .run_until(async {
            let fetcher = MemoryFetcher::new()
                .with_text("http://localhost/slow", "<i></i>")
                .with_text("http://localhost/fast", "<b></b>")
                .with_latency("http://localhost/slow", Duration::from_millis(40))
                .with_latency("http://localhost/fast", Duration::from_millis(5));
            let harness = Harness::new(fetcher);
            let ready = count_events(&harness, events::READY);
            let registry = harness.registry();

            let slow = registry.define("my-slow", |def| def.html("slow"));
            let fast = registry.define("my-fast", |def| def.html("fast"));
            let plain = registry.define("my-plain", |_| Ok(()));
            assert_eq!(registry.pending_count(), 3);

            fast.await.unwrap();
            plain.await.unwrap();
            assert_eq!(ready.get(), 0);
            slow.await.unwrap();
            assert_eq!(ready.get(), 0);

            registry.ready().await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(ready.get(), 1);
            assert!(registry.is_ready());

            let element = harness.mount("my-slow").await;
            assert_eq!(element.shadow_root().unwrap().inner_html(), "<i></i>");
        })
        .await;
}

#[tokio::test]
async fn undefine_does_not_free_the_element_name() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            let undefined = count_events(&harness, events::UNDEFINED);
            let registry = harness.registry();
            registry.define("my-gone", |_| Ok(())).await.unwrap();

            assert!(registry.undefine("my-gone"));
            assert!(!registry.undefine("my-gone"));
            assert!(!registry.has("my-gone"));
            assert_eq!(undefined.get(), 1);

            let err = registry.define("my-gone", |_| Ok(())).await.unwrap_err();
            assert!(matches!(err, ZephError::AlreadyRegistered(_)));
            assert!(registry.has("my-gone"));
            assert!(!registry.components().contains("my-gone"));
        })
        .await;
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

#[tokio::test]
async fn html_overwrite_and_append() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            harness
                .registry()
                .define("my-sheet", |def| {
                    def.html("<a></a>")?;
                    def.html_with("<b></b>", ResourceOptions::new().overwrite())?;
                    def.html("<i></i>")
                })
                .await
                .unwrap();
            let element = harness.mount("my-sheet").await;
            insta::assert_snapshot!(element.shadow_root().unwrap().inner_html(), @"<b></b><i></i>");
        })
        .await;
}

#[tokio::test]
async fn attribute_binding_follows_the_root() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            harness
                .registry()
                .define("my-mirror", |def| {
                    def.html_with("<div></div>", literal())?;
                    def.attribute("x", "one")?;
                    def.bind("@x", "div")
                })
                .await
                .unwrap();
            let element = harness.mount("my-mirror").await;
            let div = element.shadow_root().unwrap().query_selector("div").unwrap().unwrap();
            assert_eq!(div.get_attribute("x").as_deref(), Some("one"));

            element.set_attribute("x", "two");
            assert_eq!(div.get_attribute("x").as_deref(), Some("two"));
            element.remove_attribute("x");
            assert!(!div.has_attribute("x"));
        })
        .await;
}

#[tokio::test]
async fn badge_label_changes_reach_attribute_listeners() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            let changes = Rc::new(RefCell::new(Vec::new()));
            let log = changes.clone();
            harness
                .registry()
                .define("my-badge", move |def| {
                    def.html_with("<b></b>", literal())?;
                    def.attribute("label", "hi")?;
                    def.on_attribute("label", move |old, new, element: &Element, _content: &Element| {
                        assert_eq!(element.tag_name(), "my-badge");
                        log.borrow_mut().push((old.map(str::to_owned), new.map(str::to_owned)));
                        Ok(())
                    })
                })
                .await
                .unwrap();

            let badge = harness.mount("my-badge").await;
            assert_eq!(badge.get_attribute("label").as_deref(), Some("hi"));
            changes.borrow_mut().clear();

            // Removal and re-add are separate records, so the listener sees
            // (hi, none) and then (none, bye) rather than one (hi, bye) call.
            badge.remove_attribute("label");
            badge.set_attribute("label", "bye");
            assert!(changes.borrow().is_empty());
            harness.settle().await;
            assert_eq!(
                *changes.borrow(),
                vec![(Some("hi".to_owned()), None), (None, Some("bye".to_owned()))]
            );
        })
        .await;
}

#[tokio::test]
async fn inherited_create_listeners_run_parent_first() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            let order = Rc::new(RefCell::new(Vec::new()));
            let registry = harness.registry();

            let log = order.clone();
            let child = registry.define("my-child", move |def| {
                def.from("my-parent")?;
                def.on_create(move |_: &Element, _: &Element| -> ListenerResult {
                    log.borrow_mut().push("child");
                    Ok(())
                });
                Ok(())
            });
            let log = order.clone();
            let parent = registry.define("my-parent", move |def| {
                def.on_create(move |_: &Element, _: &Element| -> ListenerResult {
                    log.borrow_mut().push("parent");
                    Ok(())
                });
                Ok(())
            });

            parent.await.unwrap();
            child.await.unwrap();
            harness.mount("my-child").await;
            assert_eq!(*order.borrow(), vec!["parent", "child"]);
        })
        .await;
}

#[tokio::test]
async fn image_assets_become_background_images() {
    LocalSet::new()
        .run_until(async {
            let fetcher =
                MemoryFetcher::new().with_binary("http://localhost/img.png", vec![137, 80, 78, 71], Some("image/png"));
            let harness = Harness::new(fetcher);
            harness
                .registry()
                .define("my-photo", |def| {
                    def.html_with(r#"<div class="photo"></div>"#, literal())?;
                    def.asset(".photo", "./img.png")
                })
                .await
                .unwrap();
            let element = harness.mount("my-photo").await;
            let photo = element.shadow_root().unwrap().query_selector(".photo").unwrap().unwrap();
            let background = photo.style("background-image").unwrap();
            assert!(background.starts_with("url('data:image/png;base64,"), "{background}");
            assert!(!photo.has_attribute("src"));
        })
        .await;
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[tokio::test]
async fn services_are_shared_through_the_registry() {
    LocalSet::new()
        .run_until(async {
            let harness = Harness::new(MemoryFetcher::new());
            let registered = count_events(&harness, events::SERVICE_REGISTERED);
            let services = harness.registry().services();
            let bus = services.create("bus").unwrap();

            let seen = Rc::new(Cell::new(0));
            let sink = seen.clone();
            services.get("bus").unwrap().on("ping", move |_| {
                sink.set(sink.get() + 1);
                Ok(())
            });
            bus.fire("ping", Vec::new());
            harness.settle().await;

            assert_eq!(seen.get(), 1);
            assert_eq!(registered.get(), 1);
            assert!(services.create("bus").is_err());
            assert!(services.unregister("bus").is_some());
            assert!(!services.has("bus"));
        })
        .await;
}
