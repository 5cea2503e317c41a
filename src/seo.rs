//! Search engine metadata: `<meta>` tags and a schema.org `Hotel` block.

use crate::dom::Element;
use crate::site::{SiteContent, Source};
use serde_json::{json, Map, Value};

/// SEO description: the settings description, falling back to the tagline.
pub fn page_description(settings: &Source) -> String {
    let blocks = settings.blocks("description");
    if blocks.is_empty() {
        settings.text("tagline")
    } else {
        blocks.join(" ")
    }
}

fn absolute(site_url: &str, url: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        format!("{}{}", site_url, url)
    } else {
        url.to_string()
    }
}

fn meta(attr: &str, key: &str, content: &str) -> Element {
    Element::new("meta")
        .with_attr(attr, key)
        .with_attr("content", content)
}

pub fn meta_tags(settings: &Source, title: &str, description: &str, canonical: &str) -> Vec<Element> {
    let mut tags = vec![
        meta("name", "description", description),
        Element::new("link")
            .with_attr("rel", "canonical")
            .with_attr("href", canonical),
        meta("property", "og:type", "website"),
        meta("property", "og:title", title),
        meta("property", "og:description", description),
        meta("property", "og:url", canonical),
    ];
    let name = settings.text("hotelName");
    if !name.is_empty() {
        tags.push(meta("property", "og:site_name", &name));
    }
    let logo = settings.text("logo.url");
    if !logo.is_empty() {
        let origin = canonical
            .find("://")
            .and_then(|i| canonical[i + 3..].find('/').map(|j| &canonical[..i + 3 + j]))
            .unwrap_or(canonical);
        tags.push(meta("property", "og:image", &absolute(origin, &logo)));
    }
    tags
}

/// schema.org `Hotel` description of the property.
pub fn hotel_json_ld(content: &SiteContent, site_url: &str) -> Value {
    let settings = content.settings();
    let home = content.home();
    let mut hotel = Map::new();
    hotel.insert("@context".into(), json!("https://schema.org"));
    hotel.insert("@type".into(), json!("Hotel"));
    hotel.insert("url".into(), json!(format!("{}/", site_url)));

    let mut put = |key: &str, value: String| {
        if !value.is_empty() {
            hotel.insert(key.into(), Value::String(value));
        }
    };
    put("name", settings.text("hotelName"));
    put("description", page_description(&settings));
    put("telephone", settings.text("contact.phone"));
    put("email", settings.text("contact.email"));
    put("checkinTime", settings.text("checkInTime"));
    put("checkoutTime", settings.text("checkOutTime"));
    put("priceRange", settings.text("priceRange"));

    let address = settings.text("contact.address");
    if !address.is_empty() {
        hotel.insert(
            "address".into(),
            json!({"@type": "PostalAddress", "streetAddress": address}),
        );
    }

    let images: Vec<Value> = [home.text("hero.image.url"), settings.text("logo.url")]
        .into_iter()
        .filter(|u| !u.is_empty())
        .map(|u| Value::String(absolute(site_url, &u)))
        .collect();
    if !images.is_empty() {
        hotel.insert("image".into(), Value::Array(images));
    }

    if let Some(stars) = settings.get("starRating").and_then(Value::as_f64) {
        hotel.insert(
            "starRating".into(),
            json!({"@type": "Rating", "ratingValue": stars}),
        );
    }

    let amenities: Vec<Value> = home
        .blocks("highlights")
        .into_iter()
        .map(|name| json!({"@type": "LocationFeatureSpecification", "name": name, "value": true}))
        .collect();
    if !amenities.is_empty() {
        hotel.insert("amenityFeature".into(), Value::Array(amenities));
    }

    let rooms: Vec<Value> = content
        .rooms
        .iter()
        .map(|r| {
            let room = Source::new(r, "", "room");
            json!({
                "@type": "HotelRoom",
                "name": room.text("name"),
                "description": room.text("summary"),
                "url": format!("{}/rooms/{}", site_url, urlencoding::encode(&room.text("slug"))),
            })
        })
        .collect();
    if !rooms.is_empty() {
        hotel.insert("containsPlace".into(), Value::Array(rooms));
    }

    Value::Object(hotel)
}

/// `<script type="application/ld+json">` carrying `data`.
pub fn json_ld_script(data: &Value) -> Element {
    // Script content is written raw; keep a `</script>` inside a string from ending it.
    let body = data.to_string().replace("</", "<\\/");
    Element::new("script")
        .with_attr("type", "application/ld+json")
        .with_text(body)
}
