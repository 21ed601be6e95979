//! The directive vocabulary.
//!
//! A [`Definition`] is handed to every definition function. Each directive
//! validates its arguments and fails immediately; anything that needs the
//! network is queued as pending work, drained by [`Definition::settle`].

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::binding::{Binding, BindingEnd, Sigil, ROOT};
use super::definition::{
    Asset, AssetOptions, AttributeDef, DefinitionContext, EventAtDef, EventDef, Fragment, PendingWork, PropertyDef,
    ResourceOptions, ValueOptions,
};
use crate::config::ZephConfig;
use crate::dom::{parse_selector_list, validate_element_name, Element};
use crate::element::ElementClass;
use crate::error::{ListenerResult, Result, ZephError};
use crate::event::Event;
use crate::registry::RegistryState;
use crate::resource::{resolve, Resolver};
use crate::value::{Transform, Value};

#[derive(Clone, Copy)]
enum Sheet {
    Html,
    Css,
}

impl Sheet {
    fn directive(self) -> &'static str {
        match self {
            Sheet::Html => "html",
            Sheet::Css => "css",
        }
    }

    fn slots(self, context: &mut DefinitionContext) -> &mut Vec<Option<Fragment>> {
        match self {
            Sheet::Html => &mut context.html,
            Sheet::Css => &mut context.css,
        }
    }
}

fn require(directive: &'static str, what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ZephError::validation(directive, format!("{what} must be a non-empty string")));
    }
    Ok(())
}

fn require_selector(directive: &'static str, selector: &str, allow_root: bool) -> Result<()> {
    require(directive, "selector", selector)?;
    if allow_root && selector == ROOT {
        return Ok(());
    }
    parse_selector_list(selector)?;
    Ok(())
}

/// Directive handle for one component definition.
#[derive(Clone)]
pub struct Definition {
    context: Rc<RefCell<DefinitionContext>>,
    resolver: Resolver,
    config: ZephConfig,
    registry: Weak<RegistryState>,
}

impl Definition {
    pub(crate) fn new(
        context: DefinitionContext,
        resolver: Resolver,
        config: ZephConfig,
        registry: Weak<RegistryState>,
    ) -> Self {
        Self {
            context: Rc::new(RefCell::new(context)),
            resolver,
            config,
            registry,
        }
    }

    /// A definition not attached to any registry. `from` cannot settle.
    pub fn detached(name: &str, origin: &str, resolver: Resolver, config: ZephConfig) -> Self {
        Self::new(DefinitionContext::new(name, origin), resolver, config, Weak::new())
    }

    pub fn name(&self) -> String {
        self.context.borrow().name.clone()
    }

    pub fn context(&self) -> Ref<'_, DefinitionContext> {
        self.context.borrow()
    }

    pub(crate) fn replace_context(&self, context: DefinitionContext) {
        *self.context.borrow_mut() = context;
    }

    /// Drive every pending resource and parent wait to completion. Work
    /// queued while settling is drained too. The first failure wins.
    pub async fn settle(&self) -> Result<()> {
        loop {
            let pending: Vec<PendingWork> = std::mem::take(&mut self.context.borrow_mut().pending);
            if pending.is_empty() {
                return Ok(());
            }
            futures::future::try_join_all(pending).await?;
        }
    }

    // -- markup and style -------------------------------------------------

    /// Append markup, or the text of a resource the argument names.
    pub fn html(&self, content: &str) -> Result<()> {
        self.html_with(content, ResourceOptions::default())
    }

    pub fn html_with(&self, content: &str, options: ResourceOptions) -> Result<()> {
        self.sheet(Sheet::Html, content, options)
    }

    /// Append a style sheet, or the text of a resource the argument names.
    pub fn css(&self, content: &str) -> Result<()> {
        self.css_with(content, ResourceOptions::default())
    }

    pub fn css_with(&self, content: &str, options: ResourceOptions) -> Result<()> {
        self.sheet(Sheet::Css, content, options)
    }

    fn sheet(&self, sheet: Sheet, content: &str, options: ResourceOptions) -> Result<()> {
        require(sheet.directive(), "content", content)?;
        let mut context = self.context.borrow_mut();
        let overwrite = options.overwrite;
        if options.no_remote || !self.config.remote_lookup {
            sheet.slots(&mut context).push(Some(Fragment {
                template: content.to_owned(),
                overwrite,
            }));
            return Ok(());
        }

        let base = context.origin.clone();
        let slots = sheet.slots(&mut context);
        let index = slots.len();
        slots.push(None);

        let extension = match sheet {
            Sheet::Html => self.config.html_extension.clone(),
            Sheet::Css => self.config.css_extension.clone(),
        };
        context.pending.push(Box::pin(load_sheet(
            self.resolver.clone(),
            Rc::downgrade(&self.context),
            SheetSlot {
                sheet,
                index,
                overwrite,
            },
            content.to_owned(),
            base,
            extension,
        )));
        Ok(())
    }

    // -- assets -----------------------------------------------------------

    /// Fetch a binary resource and write it as a data URI onto every
    /// element matching `selector` in the shadow content.
    pub fn asset(&self, selector: &str, url: &str) -> Result<()> {
        self.asset_with(selector, url, AssetOptions::default())
    }

    pub fn asset_with(&self, selector: &str, url: &str, options: AssetOptions) -> Result<()> {
        require_selector("asset", selector, false)?;
        require("asset", "url", url)?;
        if let Some(attribute) = &options.attribute {
            require("asset", "attribute", attribute)?;
        }
        let mut context = self.context.borrow_mut();
        let resolved = resolve(url, &context.origin)
            .ok_or_else(|| ZephError::validation("asset", format!("cannot resolve '{url}'")))?;

        let index = context.assets.len();
        context.assets.push(None);
        context.pending.push(Box::pin(load_asset(
            self.resolver.clone(),
            Rc::downgrade(&self.context),
            index,
            selector.to_owned(),
            resolved,
            options.attribute,
        )));
        Ok(())
    }

    // -- attributes and properties ----------------------------------------

    /// Declare an attribute with an initial value.
    pub fn attribute(&self, name: &str, initial: impl Into<Value>) -> Result<()> {
        self.attribute_with(name, ValueOptions::new().with_initial(initial))
    }

    pub fn attribute_with(&self, name: &str, options: ValueOptions) -> Result<()> {
        require("attribute", "name", name)?;
        let name = name.to_ascii_lowercase();
        let mut context = self.context.borrow_mut();
        if context.attributes.contains_key(&name) {
            return Err(ZephError::DuplicateAttribute(name));
        }
        context.attributes.insert(name, AttributeDef {
            initial: options.initial,
            transforms: options.transform.into_iter().collect(),
        });
        Ok(())
    }

    /// Declare a property with an initial value.
    pub fn property(&self, name: &str, initial: impl Into<Value>) -> Result<()> {
        self.property_with(name, ValueOptions::new().with_initial(initial))
    }

    /// Declare a property. An entry created earlier by `on_property` is
    /// completed rather than rejected.
    pub fn property_with(&self, name: &str, options: ValueOptions) -> Result<()> {
        require("property", "name", name)?;
        let mut context = self.context.borrow_mut();
        let entry = context.properties.entry(name.to_owned()).or_default();
        if entry.declared {
            return Err(ZephError::DuplicateProperty(name.to_owned()));
        }
        entry.declared = true;
        entry.initial = options.initial;
        entry.transforms.extend(options.transform);
        Ok(())
    }

    // -- bindings ---------------------------------------------------------

    /// Propagate `name` on the root element to the same name on every
    /// element matching `target`.
    pub fn bind(&self, name: &str, target: &str) -> Result<()> {
        self.bind_at(ROOT, name, target, name, None)
    }

    /// Propagate `source` on the root element to `target_name` on every
    /// element matching `target`.
    pub fn bind_to(&self, source: &str, target: &str, target_name: &str, transform: Option<Transform>) -> Result<()> {
        self.bind_at(ROOT, source, target, target_name, transform)
    }

    /// Fully explicit binding. Re-declaring a pair replaces it.
    pub fn bind_at(
        &self,
        source_element: &str,
        source_name: &str,
        target_element: &str,
        target_name: &str,
        transform: Option<Transform>,
    ) -> Result<()> {
        require_selector("bind", source_element, true)?;
        require_selector("bind", target_element, true)?;
        let binding = Binding {
            source: BindingEnd {
                element: source_element.to_owned(),
                name: Sigil::parse(source_name)?,
            },
            target: BindingEnd {
                element: target_element.to_owned(),
                name: Sigil::parse(target_name)?,
            },
            transform,
        };
        self.context.borrow_mut().bindings.insert(binding.key(), binding);
        Ok(())
    }

    // -- composition ------------------------------------------------------

    /// Inherit everything `parent` declares. The merge happens once the
    /// parent is defined.
    pub fn from(&self, parent: &str) -> Result<()> {
        require("from", "parent", parent)?;
        let mut context = self.context.borrow_mut();
        if let Some(existing) = &context.from {
            return Err(ZephError::validation(
                "from",
                format!("'{}' already inherits from '{existing}'", context.name),
            ));
        }
        if parent == context.name {
            return Err(ZephError::validation("from", "a component cannot inherit from itself"));
        }
        context.from = Some(parent.to_owned());
        let registry = self.registry.clone();
        let parent = parent.to_owned();
        context.pending.push(Box::pin(async move {
            let wait = {
                let registry = registry.upgrade().ok_or(ZephError::RegistryUnavailable)?;
                registry.wait_for(&parent)
            };
            wait.await
        }));
        Ok(())
    }

    /// Register the same class under another name as well.
    pub fn alias(&self, name: &str) -> Result<()> {
        validate_element_name(name)?;
        self.context.borrow_mut().aliases.insert(name.to_owned());
        Ok(())
    }

    // -- lifecycle --------------------------------------------------------

    /// Runs once, when the class is registered.
    pub fn on_init(&self, listener: impl Fn(&ElementClass) -> ListenerResult + 'static) {
        self.context.borrow_mut().lifecycle.init.push(Rc::new(listener));
    }

    /// Runs during setup of every instance, before bindings and events.
    pub fn on_create(&self, listener: impl Fn(&Element, &Element) -> ListenerResult + 'static) {
        self.context.borrow_mut().lifecycle.create.push(Rc::new(listener));
    }

    pub fn on_add(&self, listener: impl Fn(&Element, &Element) -> ListenerResult + 'static) {
        self.context.borrow_mut().lifecycle.add.push(Rc::new(listener));
    }

    pub fn on_remove(&self, listener: impl Fn(&Element, &Element) -> ListenerResult + 'static) {
        self.context.borrow_mut().lifecycle.remove.push(Rc::new(listener));
    }

    pub fn on_adopt(&self, listener: impl Fn(&Element, &Element) -> ListenerResult + 'static) {
        self.context.borrow_mut().lifecycle.adopt.push(Rc::new(listener));
    }

    /// Listen for changes of `name`, which becomes an observed attribute.
    pub fn on_attribute(
        &self,
        name: &str,
        listener: impl Fn(Option<&str>, Option<&str>, &Element, &Element) -> ListenerResult + 'static,
    ) -> Result<()> {
        require("on_attribute", "name", name)?;
        let name = name.to_ascii_lowercase();
        let mut context = self.context.borrow_mut();
        context.observed.insert(name.clone());
        context
            .lifecycle
            .attribute
            .entry(name)
            .or_default()
            .push(Rc::new(listener));
        Ok(())
    }

    /// Listen for changes of property `name`, declaring it implicitly when
    /// needed.
    pub fn on_property(
        &self,
        name: &str,
        listener: impl Fn(Option<&Value>, Option<&Value>, &Element, &Element) -> ListenerResult + 'static,
    ) -> Result<()> {
        require("on_property", "name", name)?;
        let mut context = self.context.borrow_mut();
        let entry: &mut PropertyDef = context.properties.entry(name.to_owned()).or_default();
        entry.changes.push(Rc::new(listener));
        Ok(())
    }

    // -- events -----------------------------------------------------------

    /// Listen for `event` on the root element.
    pub fn on_event(
        &self,
        event: &str,
        listener: impl Fn(&Event, &Element, &Element) -> ListenerResult + 'static,
    ) -> Result<()> {
        require("on_event", "event", event)?;
        self.context.borrow_mut().events.push(EventDef {
            event: event.to_owned(),
            listener: Rc::new(listener),
        });
        Ok(())
    }

    /// Listen for `event` on every element of the shadow content that
    /// matches `selector` at setup time.
    pub fn on_event_at(
        &self,
        selector: &str,
        event: &str,
        listener: impl Fn(&Event, &Element, &Element) -> ListenerResult + 'static,
    ) -> Result<()> {
        require_selector("on_event_at", selector, false)?;
        require("on_event_at", "event", event)?;
        self.context.borrow_mut().events_at.push(EventAtDef {
            selector: selector.to_owned(),
            event: event.to_owned(),
            listener: Rc::new(listener),
        });
        Ok(())
    }
}

struct SheetSlot {
    sheet: Sheet,
    index: usize,
    overwrite: bool,
}

async fn load_sheet(
    resolver: Resolver,
    target: Weak<RefCell<DefinitionContext>>,
    slot: SheetSlot,
    content: String,
    base: String,
    extension: String,
) -> Result<()> {
    let template = resolver.resolve_content(&content, &base, &extension).await?;
    if let Some(context) = target.upgrade() {
        let mut context = context.borrow_mut();
        if let Some(entry) = slot.sheet.slots(&mut context).get_mut(slot.index) {
            *entry = Some(Fragment {
                template,
                overwrite: slot.overwrite,
            });
        }
    }
    Ok(())
}

async fn load_asset(
    resolver: Resolver,
    target: Weak<RefCell<DefinitionContext>>,
    index: usize,
    selector: String,
    url: String,
    attribute: Option<String>,
) -> Result<()> {
    let Some(binary) = resolver.fetch_binary(&url).await? else {
        tracing::warn!(url = %url, "asset not found, skipping");
        return Ok(());
    };
    if let Some(context) = target.upgrade() {
        if let Some(entry) = context.borrow_mut().assets.get_mut(index) {
            *entry = Some(Asset {
                selector,
                data: binary.data,
                content_type: binary.content_type,
                attribute,
            });
        }
    }
    Ok(())
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("context", &*self.context.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::MemoryFetcher;
    use crate::value::transform;

    fn definition(fetcher: MemoryFetcher) -> Definition {
        Definition::detached(
            "x-test",
            "http://localhost/components/x-test.js",
            Resolver::new(Rc::new(fetcher)),
            ZephConfig::default(),
        )
    }

    fn templates(definition: &Definition) -> Vec<String> {
        definition
            .context()
            .html_fragments()
            .map(|fragment| fragment.template.clone())
            .collect()
    }

    #[test]
    fn validation_is_synchronous() {
        let def = definition(MemoryFetcher::new());
        assert!(matches!(def.html(""), Err(ZephError::Validation { directive: "html", .. })));
        assert!(matches!(def.css("  "), Err(ZephError::Validation { directive: "css", .. })));
        assert!(matches!(def.asset("", "a.png"), Err(ZephError::Validation { .. })));
        assert!(matches!(def.asset("[", "a.png"), Err(ZephError::Selector(_))));
        assert!(matches!(def.on_event("", |_: &Event, _: &Element, _: &Element| Ok(())), Err(ZephError::Validation { .. })));
        assert!(matches!(def.alias("nodash"), Err(ZephError::InvalidName { .. })));
        assert!(matches!(def.bind("label", "div"), Err(ZephError::InvalidBindingName(_))));
        assert!(matches!(def.bind("@x", ""), Err(ZephError::Validation { .. })));
        assert_eq!(def.context().pending_count(), 0);
    }

    #[test]
    fn duplicate_attribute_is_rejected() {
        let def = definition(MemoryFetcher::new());
        def.attribute("a", 1).unwrap();
        let err = def.attribute("A", 2).unwrap_err();
        assert!(matches!(err, ZephError::DuplicateAttribute(ref name) if name == "a"));
        assert_eq!(def.context().attributes["a"].initial, Some(Value::from(1)));
    }

    #[test]
    fn on_property_then_property_completes_the_entry() {
        let def = definition(MemoryFetcher::new());
        def.on_property("count", |_: Option<&Value>, _: Option<&Value>, _: &Element, _: &Element| Ok(()))
            .unwrap();
        def.property("count", 0).unwrap();
        assert!(matches!(def.property("count", 1), Err(ZephError::DuplicateProperty(_))));
        let context = def.context();
        let entry = &context.properties["count"];
        assert!(entry.declared);
        assert_eq!(entry.changes.len(), 1);
        assert_eq!(entry.initial, Some(Value::from(0)));
    }

    #[test]
    fn bindings_overwrite_by_key() {
        let def = definition(MemoryFetcher::new());
        def.bind("@x", "div").unwrap();
        def.bind_to("@x", "div", "@x", Some(transform(|v| v))).unwrap();
        def.bind_at("span", "$", ".", ".text", None).unwrap();
        let context = def.context();
        assert_eq!(context.bindings.len(), 2);
        assert!(context.bindings[".:@x>div:@x"].transform.is_some());
        assert!(context.bindings.contains_key("span:$>.:.text"));
    }

    #[test]
    fn on_attribute_marks_observed() {
        let def = definition(MemoryFetcher::new());
        def.on_attribute("Label", |_: Option<&str>, _: Option<&str>, _: &Element, _: &Element| Ok(()))
            .unwrap();
        assert!(def.context().observed.contains("label"));
        assert_eq!(def.context().lifecycle.attribute["label"].len(), 1);
    }

    #[tokio::test]
    async fn literal_html_skips_the_network() {
        let fetcher = Rc::new(MemoryFetcher::new());
        let def = Definition::detached(
            "x-test",
            "http://localhost/",
            Resolver::new(fetcher.clone()),
            ZephConfig::default(),
        );
        def.html_with("<b></b>", ResourceOptions::new().no_remote()).unwrap();
        assert_eq!(def.context().pending_count(), 0);
        def.settle().await.unwrap();
        assert_eq!(templates(&def), vec!["<b></b>"]);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn resources_keep_declaration_order() {
        let fetcher = MemoryFetcher::new()
            .with_text("http://localhost/components/slow.html", "<slow></slow>")
            .with_latency("http://localhost/components/slow", Duration::from_millis(50))
            .with_latency("http://localhost/components/slow.html", Duration::from_millis(50));
        let def = definition(fetcher);
        def.html("slow").unwrap();
        def.html("<fast></fast>").unwrap();
        assert_eq!(def.context().pending_count(), 2);
        assert!(templates(&def).is_empty());

        def.settle().await.unwrap();
        assert_eq!(templates(&def), vec!["<slow></slow>", "<fast></fast>"]);
        assert_eq!(def.context().pending_count(), 0);
    }

    #[tokio::test]
    async fn assets_fetch_binary_data() {
        let fetcher = MemoryFetcher::new().with_binary(
            "http://localhost/components/img.png",
            vec![1, 2, 3],
            Some("image/png"),
        );
        let def = definition(fetcher);
        def.asset(".photo", "./img.png").unwrap();
        def.asset("img", "missing.png").unwrap();
        def.settle().await.unwrap();
        let context = def.context();
        let assets: Vec<&Asset> = context.resolved_assets().collect();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].data_uri(), "data:image/png;base64,AQID");
        assert_eq!(context.assets.len(), 2);
    }

    #[tokio::test]
    async fn transport_failures_reject_settle() {
        let fetcher = MemoryFetcher::new().with_failure("http://localhost/components/x.css");
        let def = definition(fetcher);
        def.css("x.css").unwrap();
        assert!(matches!(def.settle().await, Err(ZephError::Network { .. })));
    }

    #[tokio::test]
    async fn detached_from_cannot_settle() {
        let def = definition(MemoryFetcher::new());
        def.from("x-parent").unwrap();
        assert!(matches!(def.from("x-other"), Err(ZephError::Validation { directive: "from", .. })));
        assert!(matches!(def.settle().await, Err(ZephError::RegistryUnavailable)));
    }
}
