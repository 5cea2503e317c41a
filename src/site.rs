//! Public pages, rendered from CMS documents.
//!
//! Every value that comes from a document is emitted with a
//! `data-field-ref` token so the preview layer can find it again, and each
//! document's subtree carries its `data-doc-type`. In preview mode the page
//! also gets the editor styles and script, and its fields are annotated
//! with their types.

use crate::classify::{annotate, DOC_TYPE_ATTR};
use crate::cms::{get_path, DocumentQuery, DocumentStore, LocalStore};
use crate::dom::{Document, Element};
use crate::error::RemoteError;
use crate::models::{FieldRef, FIELD_REF_ATTR};
use crate::overlay::FIELD_LABEL_ATTR;
use crate::payload::split_paragraphs;
use crate::schema;
use crate::seo;
use crate::templates::{page_head, preview_chrome, site_footer, site_header};
use serde_json::{json, Value};

pub const HOME_ID: &str = "homePage";
pub const SETTINGS_ID: &str = "siteSettings";

// ============================================================================
// Content Access
// ============================================================================

/// One CMS document as seen by the page renderer.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub id: &'a str,
    pub doc_type: &'a str,
    pub value: &'a Value,
}

impl<'a> Source<'a> {
    pub fn new(value: &'a Value, fallback_id: &'a str, fallback_type: &'a str) -> Self {
        Self {
            id: value.get("_id").and_then(Value::as_str).unwrap_or(fallback_id),
            doc_type: value.get("_type").and_then(Value::as_str).unwrap_or(fallback_type),
            value,
        }
    }

    pub fn get(&self, path: &str) -> Option<&'a Value> {
        get_path(self.value, path).ok().flatten()
    }

    pub fn text(&self, path: &str) -> String {
        self.get(path)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Block content stored either as an array of strings or as one string.
    pub fn blocks(&self, path: &str) -> Vec<String> {
        match self.get(path) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => split_paragraphs(s),
            _ => Vec::new(),
        }
    }

    pub fn items(&self, path: &str) -> &'a [Value] {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// An element addressing `path` in this document.
    pub fn field(&self, tag: &str, path: &str) -> Element {
        let mut el = Element::new(tag).with_attr(FIELD_REF_ATTR, format!("{}#{}", self.id, path));
        let title = FieldRef::new(self.id, path).ok().and_then(|f| {
            schema::find_schema(self.doc_type)?
                .field(&f.field_name())
                .map(|d| d.title)
        });
        if let Some(title) = title {
            el.set_attr(FIELD_LABEL_ATTR, title);
        }
        el
    }

    pub fn text_field(&self, tag: &str, path: &str) -> Element {
        self.field(tag, path).with_text(self.text(path))
    }

    pub fn image_field(&self, path: &str, class: &str) -> Element {
        let mut img = self
            .field("img", path)
            .with_attr("src", self.text(&format!("{path}.url")))
            .with_attr("alt", self.text(&format!("{path}.alt")));
        if !class.is_empty() {
            img.set_attr("class", class);
        }
        img
    }

    /// A link whose label, URL and (for buttons) target all live under `path`.
    pub fn link_field(&self, path: &str, class: &str) -> Element {
        let mut a = self
            .field("a", path)
            .with_attr("href", self.text(&format!("{path}.url")))
            .with_text(self.text(&format!("{path}.text")));
        let target = self.text(&format!("{path}.target"));
        if !target.is_empty() {
            a.set_attr("target", target.as_str());
            if target == "_blank" {
                a.set_attr("rel", "noopener");
            }
        }
        if !class.is_empty() {
            a.set_attr("class", class);
        }
        a
    }

    /// One child element per entry.
    pub fn blocks_field(&self, tag: &str, item_tag: &str, path: &str) -> Element {
        self.field(tag, path).with_children(
            self.blocks(path)
                .into_iter()
                .map(|entry| Element::new(item_tag).with_text(entry)),
        )
    }

    pub fn root(&self, tag: &str) -> Element {
        Element::new(tag).with_attr(DOC_TYPE_ATTR, self.doc_type)
    }
}

// ============================================================================
// Loading
// ============================================================================

pub struct SiteContent {
    pub settings: Value,
    pub home: Value,
    pub rooms: Vec<Value>,
}

impl SiteContent {
    pub fn settings(&self) -> Source<'_> {
        Source::new(&self.settings, SETTINGS_ID, "siteSettings")
    }

    pub fn home(&self) -> Source<'_> {
        Source::new(&self.home, HOME_ID, "homePage")
    }
}

pub async fn load_content(store: &dyn DocumentStore) -> Result<SiteContent, RemoteError> {
    let settings = store.get_document(SETTINGS_ID).await?.unwrap_or(Value::Null);
    let home = store.get_document(HOME_ID).await?.unwrap_or(Value::Null);
    let rooms = store
        .query(&DocumentQuery::of_type("room").order_by("order"))
        .await?;
    Ok(SiteContent {
        settings,
        home,
        rooms,
    })
}

pub async fn find_room(store: &dyn DocumentStore, slug: &str) -> Result<Option<Value>, RemoteError> {
    let mut found = store
        .query(&DocumentQuery::of_type("room").where_eq("slug", slug))
        .await?;
    Ok(if found.is_empty() {
        None
    } else {
        Some(found.swap_remove(0))
    })
}

// ============================================================================
// Pages
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct PageOptions<'a> {
    pub preview: bool,
    pub authenticated: bool,
    pub site_url: &'a str,
}

pub fn render_home(content: &SiteContent, opts: &PageOptions) -> Document {
    let settings = content.settings();
    let home = content.home();

    let hero = home
        .root("section")
        .with_attr("class", "hero")
        .with_attr("data-bg", "#123b4f")
        .with_child(home.image_field("hero.image", "hero-image"))
        .with_child(
            Element::new("div")
                .with_attr("class", "hero-text")
                .with_child(home.text_field("h1", "hero.title"))
                .with_child(home.text_field("p", "hero.subtitle").with_attr("class", "subtitle"))
                .with_child(home.link_field("hero.cta", "button")),
        );

    let intro = home
        .root("section")
        .with_attr("class", "intro")
        .with_child(home.text_field("h2", "intro.title"))
        .with_child(home.blocks_field("div", "p", "intro.body"))
        .with_child(home.blocks_field("ul", "li", "highlights").with_attr("class", "highlights"));

    let rooms = Element::new("section")
        .with_attr("id", "rooms")
        .with_child(Element::new("h2").with_text("Rooms"))
        .with_child(
            Element::new("div")
                .with_attr("class", "room-grid")
                .with_children(content.rooms.iter().map(room_card)),
        );

    let gallery = home.root("section").with_attr("class", "gallery").with_children(
        (0..home.items("gallery").len()).map(|i| home.image_field(&format!("gallery[{i}].image"), "")),
    );

    let offers = home.root("section").with_attr("id", "offers").with_child(
        Element::new("div")
            .with_attr("class", "offer-grid")
            .with_children((0..home.items("offers").len()).map(|i| {
                Element::new("article")
                    .with_attr("class", "offer")
                    .with_child(home.text_field("h3", &format!("offers[{i}].title")))
                    .with_child(home.blocks_field("div", "p", &format!("offers[{i}].description")))
                    .with_child(home.link_field(&format!("offers[{i}].cta"), "button"))
            })),
    );

    let title = {
        let name = settings.text("hotelName");
        let tagline = settings.text("tagline");
        if tagline.is_empty() {
            name
        } else {
            format!("{name} | {tagline}")
        }
    };
    let canonical = format!("{}/", opts.site_url);
    let mut head_extra = seo::meta_tags(&settings, &title, &seo::page_description(&settings), &canonical);
    head_extra.push(seo::json_ld_script(&seo::hotel_json_ld(content, opts.site_url)));

    let main = Element::new("main")
        .with_child(hero)
        .with_child(intro)
        .with_child(rooms)
        .with_child(gallery)
        .with_child(offers);

    assemble(&title, head_extra, &settings, main, opts)
}

fn room_card(room: &Value) -> Element {
    let room = Source::new(room, "", "room");
    let slug = room.text("slug");
    room.root("article")
        .with_attr("class", "room-card")
        .with_child(room.image_field("image", ""))
        .with_child(
            Element::new("div")
                .with_attr("class", "room-card-body")
                .with_child(
                    Element::new("h3").with_child(
                        room.text_field("a", "name")
                            .with_attr("href", format!("/rooms/{}", urlencoding::encode(&slug))),
                    ),
                )
                .with_child(room.text_field("p", "summary"))
                .with_child(room.text_field("p", "price").with_attr("class", "price")),
        )
}

pub fn render_room(settings: &Value, room: &Value, opts: &PageOptions) -> Document {
    let settings = Source::new(settings, SETTINGS_ID, "siteSettings");
    let room = Source::new(room, "", "room");

    let detail = room
        .root("article")
        .with_attr("class", "room-detail")
        .with_child(room.text_field("h1", "name"))
        .with_child(room.text_field("p", "summary").with_attr("class", "summary"))
        .with_child(room.image_field("image", "room-image"))
        .with_child(room.blocks_field("div", "p", "description"))
        .with_child(Element::new("h2").with_text("Amenities"))
        .with_child(room.blocks_field("ul", "li", "amenities").with_attr("class", "amenities"))
        .with_child(room.text_field("p", "price").with_attr("class", "price"))
        .with_child(room.link_field("bookingLink", "button"));

    let title = format!("{} | {}", room.text("name"), settings.text("hotelName"));
    let canonical = format!("{}/rooms/{}", opts.site_url, urlencoding::encode(&room.text("slug")));
    let description = room.text("summary");
    let head_extra = seo::meta_tags(&settings, &title, &description, &canonical);

    let main = Element::new("main").with_child(Element::new("section").with_child(detail));
    assemble(&title, head_extra, &settings, main, opts)
}

pub fn render_not_found(settings: &Value, opts: &PageOptions) -> Document {
    let settings = Source::new(settings, SETTINGS_ID, "siteSettings");
    let main = Element::new("main").with_child(
        Element::new("section")
            .with_child(Element::new("h1").with_text("Page not found"))
            .with_child(
                Element::new("p").with_child(Element::new("a").with_attr("href", "/").with_text("Back to the home page")),
            ),
    );
    assemble("Not found", Vec::new(), &settings, main, &PageOptions { preview: false, ..*opts })
}

fn assemble(title: &str, head_extra: Vec<Element>, settings: &Source, main: Element, opts: &PageOptions) -> Document {
    let mut body = Element::new("body")
        .with_child(site_header(settings))
        .with_child(main)
        .with_child(site_footer(settings));
    if opts.preview {
        body = body.with_children(preview_chrome(opts.authenticated));
    }
    let mut doc = Document::new(page_head(title, head_extra, opts.preview), body);
    if opts.preview {
        annotate(&mut doc);
    }
    doc
}

// ============================================================================
// Default Content
// ============================================================================

/// Starter documents for an empty local store.
pub fn default_documents() -> Vec<Value> {
    vec![
        json!({
            "_id": SETTINGS_ID,
            "_type": "siteSettings",
            "hotelName": "Seaview Hotel",
            "tagline": "Boutique stays on the harbour",
            "description": ["A family-run hotel on the waterfront, a short walk from the old town."],
            "navigation": [
                {"text": "Rooms", "url": "/#rooms"},
                {"text": "Offers", "url": "/#offers"},
                {"text": "Book", "url": "https://booking.example.com/seaview"}
            ],
            "contact": {
                "email": "stay@seaview.example",
                "phone": "+44 1632 960123",
                "address": "1 Harbour Road, Port Isaac, PL29 3RH"
            },
            "bookingUrl": "https://booking.example.com/seaview",
            "logo": {"url": "/static/logo.svg", "alt": "Seaview Hotel"},
            "footer": {"copyright": "© Seaview Hotel"},
            "starRating": 4,
            "checkInTime": "15:00",
            "checkOutTime": "11:00",
            "priceRange": "££"
        }),
        json!({
            "_id": HOME_ID,
            "_type": "homePage",
            "hero": {
                "title": "Welcome",
                "subtitle": "Wake up to the sound of the sea",
                "image": {"url": "/static/hero.jpg", "alt": "The harbour at dawn"},
                "cta": {"text": "Book your stay", "url": "https://booking.example.com/seaview", "target": "_blank"}
            },
            "intro": {
                "title": "A harbour-front hideaway",
                "body": [
                    "Twelve rooms, each with a view over the water.",
                    "Breakfast is served on the terrace from seven."
                ]
            },
            "highlights": ["Sea views", "Terrace restaurant", "Free parking", "Dog friendly"],
            "gallery": [
                {"image": {"url": "/static/terrace.jpg", "alt": "Terrace at sunset"}},
                {"image": {"url": "/static/lounge.jpg", "alt": "Guest lounge"}}
            ],
            "offers": [{
                "title": "Midweek escape",
                "description": ["Three nights for the price of two, Sunday to Thursday."],
                "cta": {"text": "See dates", "url": "/#rooms", "target": "_self"}
            }]
        }),
        json!({
            "_id": "room-harbour-double",
            "_type": "room",
            "slug": "harbour-double",
            "order": 1,
            "name": "Harbour Double",
            "summary": "A bright double room looking straight out over the boats.",
            "description": ["King-size bed, rain shower and a window seat.", "Ideal for couples."],
            "amenities": ["King-size bed", "Rain shower", "Nespresso machine", "Free Wi-Fi"],
            "image": {"url": "/static/harbour-double.jpg", "alt": "Harbour Double room"},
            "bookingLink": {"text": "Book this room", "url": "https://booking.example.com/seaview?room=harbour-double", "target": "_blank"},
            "price": "From £140 per night"
        }),
        json!({
            "_id": "room-garden-suite",
            "_type": "room",
            "slug": "garden-suite",
            "order": 2,
            "name": "Garden Suite",
            "summary": "A ground-floor suite opening onto the walled garden.",
            "description": ["Separate lounge, sofa bed and private patio."],
            "amenities": ["Private patio", "Sofa bed", "Bath and shower", "Free Wi-Fi"],
            "image": {"url": "/static/garden-suite.jpg", "alt": "Garden Suite lounge"},
            "bookingLink": {"text": "Book this suite", "url": "https://booking.example.com/seaview?room=garden-suite", "target": "_blank"},
            "price": "From £210 per night"
        }),
    ]
}

/// Fill an empty local store with [`default_documents`]. Returns how many
/// documents were written.
pub async fn seed_if_empty(store: &LocalStore) -> Result<usize, RemoteError> {
    if !store.is_empty()? {
        return Ok(0);
    }
    let docs = default_documents();
    let count = docs.len();
    for doc in docs {
        store.create(doc).await?;
    }
    tracing::info!(count, "seeded local store with default content");
    Ok(count)
}
