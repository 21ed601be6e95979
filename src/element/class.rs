//! Generated custom element classes.
//!
//! [`ElementClass::generate`] freezes a definition context into a class the
//! realm can register. Construction populates the shadow root from the
//! context's html, css and assets and queues the rest of the setup into the
//! realm's batch. The lifecycle callbacks fan out to the context's listeners
//! on the deferred queue.

use std::fmt;
use std::rc::Rc;

use crate::context::definition::{Asset, LifecycleListener};
use crate::context::DefinitionContext;
use crate::dom::{parse_selector_list, Element};
use crate::error::ListenerResult;
use crate::event::fire_immediately;

pub struct ElementClass {
    name: String,
    context: Rc<DefinitionContext>,
    base: Option<String>,
}

impl ElementClass {
    /// Build the class for a completed context.
    pub fn generate(context: DefinitionContext) -> Rc<Self> {
        Rc::new(Self {
            name: context.name.clone(),
            context: Rc::new(context),
            base: None,
        })
    }

    /// A class registered under `name` that shares this class's context.
    pub fn alias(&self, name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            context: self.context.clone(),
            base: Some(self.name.clone()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &DefinitionContext {
        &self.context
    }

    /// For aliases, the name of the class they were derived from.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Attributes whose changes reach the attribute lifecycle listeners.
    pub fn observed_attributes(&self) -> Vec<String> {
        self.context.observed.iter().cloned().collect()
    }

    pub fn observes(&self, attribute: &str) -> bool {
        self.context.observed.contains(attribute)
    }

    /// Run the init listeners. Called once, when the class is registered.
    pub(crate) fn initialized(&self) -> usize {
        fire_immediately(&self.label("init"), &self.context.lifecycle.init, |listener| {
            listener(self)
        })
    }

    pub(crate) fn label(&self, hook: &str) -> String {
        format!("{}:{hook}", self.name)
    }

    pub(crate) fn construct(self: &Rc<Self>, element: &Element) {
        let content = element.attach_shadow();

        let mut markup = String::new();
        for fragment in self.context.html_fragments() {
            if fragment.overwrite {
                markup.clear();
            }
            markup.push_str(&fragment.template);
        }
        if !markup.is_empty() {
            content.append_html(&markup);
        }

        let mut styles: Vec<&str> = Vec::new();
        for fragment in self.context.css_fragments() {
            if fragment.overwrite {
                styles.clear();
            }
            styles.push(&fragment.template);
        }
        let document = element.owner_document();
        for css in styles {
            let style = document.create_element("style");
            style.set_text_content(css);
            content.append_child(&style);
        }

        for asset in self.context.resolved_assets() {
            apply_asset(&content, asset);
        }

        element
            .realm
            .setup
            .push(&element.realm, element.clone(), content, self.clone());
    }

    fn content_of(element: &Element) -> Element {
        element.shadow_root().unwrap_or_else(|| element.clone())
    }

    fn fire_lifecycle(&self, hook: &str, listeners: &[LifecycleListener], element: &Element) {
        let content = Self::content_of(element);
        let target = element.clone();
        element.realm.scheduler.fire(
            self.label(hook),
            listeners.to_vec(),
            move |listener| -> ListenerResult { listener(&target, &content) },
        );
    }

    pub(crate) fn connected(&self, element: &Element) {
        tracing::debug!(element = %self.name, "connected");
        self.fire_lifecycle("add", &self.context.lifecycle.add, element);
    }

    pub(crate) fn disconnected(&self, element: &Element) {
        tracing::debug!(element = %self.name, "disconnected");
        self.fire_lifecycle("remove", &self.context.lifecycle.remove, element);
    }

    pub(crate) fn adopted(&self, element: &Element) {
        tracing::debug!(element = %self.name, "adopted");
        self.fire_lifecycle("adopt", &self.context.lifecycle.adopt, element);
    }

    pub(crate) fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>, element: &Element) {
        let Some(listeners) = self.context.lifecycle.attribute.get(name) else {
            return;
        };
        let content = Self::content_of(element);
        let target = element.clone();
        let old = old.map(str::to_owned);
        let new = new.map(str::to_owned);
        element.realm.scheduler.fire(
            self.label(&format!("attribute {name}")),
            listeners.clone(),
            move |listener| -> ListenerResult { listener(old.as_deref(), new.as_deref(), &target, &content) },
        );
    }
}

/// Write an asset's data URI onto every element its selector matches.
fn apply_asset(content: &Element, asset: &Asset) {
    let selectors = match parse_selector_list(&asset.selector) {
        Ok(selectors) => selectors,
        Err(err) => {
            tracing::warn!(selector = %asset.selector, error = %err, "invalid asset selector");
            return;
        }
    };
    let targets = content.query_list(&selectors);
    if targets.is_empty() {
        tracing::warn!(selector = %asset.selector, "asset selector matched nothing");
    }
    let uri = asset.data_uri();
    for target in targets {
        match &asset.attribute {
            Some(attribute) => target.set_attribute(attribute, &uri),
            None if asset.content_type.starts_with("image/") && target.tag_name() != "img" => {
                target.set_style("background-image", &format!("url('{uri}')"));
            }
            None => target.set_attribute("src", &uri),
        }
    }
}

impl fmt::Debug for ElementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementClass")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("observed", &self.context.observed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::definition::Fragment;
    use crate::dom::Document;

    fn fragment(template: &str, overwrite: bool) -> Option<Fragment> {
        Some(Fragment {
            template: template.into(),
            overwrite,
        })
    }

    #[test]
    fn html_overwrite_resets_accumulated_markup() {
        let mut ctx = DefinitionContext::new("x-card", "");
        ctx.html.push(fragment("<a></a>", false));
        ctx.html.push(fragment("<b></b>", true));
        ctx.html.push(fragment("<i></i>", false));
        ctx.css.push(fragment("a{}", false));
        ctx.css.push(fragment("b{}", false));
        let doc = Document::new();
        doc.define_element(ElementClass::generate(ctx)).unwrap();

        let el = doc.create_element("x-card");
        let content = el.shadow_root().unwrap();
        assert_snapshot!(content.inner_html(), @"<b></b><i></i><style>a{}</style><style>b{}</style>");
    }

    #[test]
    fn assets_pick_their_target() {
        let mut ctx = DefinitionContext::new("x-gallery", "");
        ctx.html.push(fragment(
            "<div class=\"photo\"></div><img class=\"photo\"><video></video>",
            false,
        ));
        ctx.assets.push(Some(Asset {
            selector: ".photo".into(),
            data: "AQID".into(),
            content_type: "image/png".into(),
            attribute: None,
        }));
        ctx.assets.push(Some(Asset {
            selector: "video".into(),
            data: "AAAA".into(),
            content_type: "video/mp4".into(),
            attribute: Some("poster".into()),
        }));
        ctx.assets.push(None);
        let doc = Document::new();
        doc.define_element(ElementClass::generate(ctx)).unwrap();
        let content = doc.create_element("x-gallery").shadow_root().unwrap();

        let div = content.query_selector("div.photo").unwrap().unwrap();
        assert_eq!(
            div.style("background-image").as_deref(),
            Some("url('data:image/png;base64,AQID')")
        );
        let img = content.query_selector("img").unwrap().unwrap();
        assert_eq!(img.get_attribute("src").as_deref(), Some("data:image/png;base64,AQID"));
        let video = content.query_selector("video").unwrap().unwrap();
        assert_eq!(video.get_attribute("poster").as_deref(), Some("data:video/mp4;base64,AAAA"));
    }

    #[test]
    fn lifecycle_callbacks_are_deferred() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = DefinitionContext::new("x-life", "");
        for hook in ["add", "remove"] {
            let log = seen.clone();
            let listener: LifecycleListener = Rc::new(move |el: &Element, content: &Element| -> ListenerResult {
                assert!(content.host().is_some_and(|host| &host == el));
                log.borrow_mut().push(hook);
                Ok(())
            });
            match hook {
                "add" => ctx.lifecycle.add.push(listener),
                _ => ctx.lifecycle.remove.push(listener),
            }
        }
        let doc = Document::new();
        doc.define_element(ElementClass::generate(ctx)).unwrap();

        let el = doc.create_element("x-life");
        doc.body().append_child(&el);
        assert!(seen.borrow().is_empty());
        doc.flush();
        assert_eq!(*seen.borrow(), vec!["add"]);
        el.remove();
        doc.flush();
        assert_eq!(*seen.borrow(), vec!["add", "remove"]);
    }

    #[test]
    fn adopting_into_another_document_fires_adopt_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = DefinitionContext::new("x-moved", "");
        let log = seen.clone();
        let listener: LifecycleListener = Rc::new(move |el: &Element, content: &Element| -> ListenerResult {
            assert!(content.host().is_some_and(|host| &host == el));
            log.borrow_mut().push(el.tag_name());
            Ok(())
        });
        ctx.lifecycle.adopt.push(listener);
        let doc = Document::new();
        doc.define_element(ElementClass::generate(ctx)).unwrap();

        let el = doc.create_element("x-moved");
        let other = doc.create_document();
        other.adopt_node(&el);
        assert!(seen.borrow().is_empty());
        doc.flush();
        assert_eq!(*seen.borrow(), vec!["x-moved"]);
        assert_eq!(el.owner_document(), other);

        other.adopt_node(&el);
        doc.flush();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn aliases_share_the_context() {
        let mut ctx = DefinitionContext::new("x-base", "");
        ctx.observed.insert("label".into());
        let class = ElementClass::generate(ctx);
        let alias = class.alias("x-other");
        assert_eq!(alias.name(), "x-other");
        assert_eq!(alias.base(), Some("x-base"));
        assert!(alias.observes("label"));
        assert_eq!(alias.observed_attributes(), vec!["label".to_owned()]);
    }
}
