//! CSS for the public site and for the preview editing layer.

// ============================================================================
// Site
// ============================================================================

pub const SITE_STYLE: &str = r#"
:root {
    --sand: #f6f1e7;
    --shell: #fffdf8;
    --ink: #1f2a36;
    --muted: #6b7785;
    --sea: #1d5c7a;
    --sea-deep: #123b4f;
    --coral: #d9734e;
    --line: #e4dccb;

    --bg: var(--shell);
    --fg: var(--ink);
    --link: var(--sea);
    --link-hover: var(--coral);
}

* { box-sizing: border-box; }

body {
    margin: 0;
    font-family: Georgia, "Times New Roman", serif;
    background: var(--bg);
    color: var(--fg);
    line-height: 1.6;
}

a { color: var(--link); }
a:hover { color: var(--link-hover); }

.site-header {
    display: flex;
    align-items: center;
    gap: 1.5rem;
    padding: 1rem 2rem;
    background: var(--shell);
    border-bottom: 1px solid var(--line);
}
.site-header .brand {
    display: flex;
    align-items: center;
    gap: 0.75rem;
    font-size: 1.4rem;
    color: var(--ink);
    text-decoration: none;
}
.site-header .brand img { height: 40px; width: auto; }
.site-header .tagline { color: var(--muted); font-style: italic; }
.site-header nav { margin-left: auto; display: flex; gap: 1.25rem; }
.site-header nav a { text-decoration: none; font-family: system-ui, sans-serif; }

.hero {
    position: relative;
    min-height: 60vh;
    display: flex;
    align-items: flex-end;
    color: #fff;
    background: var(--sea-deep);
    overflow: hidden;
}
.hero .hero-image {
    position: absolute;
    inset: 0;
    width: 100%;
    height: 100%;
    object-fit: cover;
    opacity: 0.55;
}
.hero .hero-text { position: relative; padding: 3rem 2rem; max-width: 48rem; }
.hero h1 { font-size: 3rem; margin: 0 0 0.5rem; }
.hero .subtitle { font-size: 1.25rem; margin: 0 0 1.5rem; }

.button {
    display: inline-block;
    padding: 0.75rem 1.5rem;
    background: var(--coral);
    color: #fff;
    border-radius: 999px;
    text-decoration: none;
    font-family: system-ui, sans-serif;
}
.button:hover { background: var(--sea); color: #fff; }

section { padding: 3rem 2rem; max-width: 72rem; margin: 0 auto; }
section h2 { font-size: 2rem; margin-top: 0; }

.highlights { display: flex; flex-wrap: wrap; gap: 0.75rem; list-style: none; padding: 0; }
.highlights li {
    background: var(--sand);
    border: 1px solid var(--line);
    border-radius: 999px;
    padding: 0.35rem 1rem;
}

.room-grid, .offer-grid, .gallery {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(16rem, 1fr));
    gap: 1.5rem;
}
.room-card, .offer {
    background: var(--sand);
    border: 1px solid var(--line);
    border-radius: 12px;
    overflow: hidden;
}
.room-card img, .gallery img { width: 100%; height: 12rem; object-fit: cover; display: block; }
.room-card .room-card-body, .offer { padding: 1rem 1.25rem; }
.room-card .price { color: var(--sea); font-weight: bold; }

.room-detail .room-image { width: 100%; max-height: 28rem; object-fit: cover; border-radius: 12px; }
.room-detail .amenities { columns: 2; }

.site-footer {
    background: var(--sea-deep);
    color: var(--sand);
    padding: 2rem;
    font-family: system-ui, sans-serif;
}
.site-footer a { color: var(--sand); }
.site-footer .contact { display: flex; flex-wrap: wrap; gap: 1.5rem; }
"#;

// ============================================================================
// Preview Layer
// ============================================================================

/// Editing affordances and the overlay. Colours come from the `--editor-*`
/// custom properties the theme adapter writes onto each element.
pub const PREVIEW_STYLE: &str = r#"
[data-field-ref] {
    outline: 1px dashed transparent;
    outline-offset: 3px;
    cursor: pointer;
    transition: outline-color 0.15s;
}
[data-field-ref]:hover,
[data-field-ref][data-editor-palette] {
    outline-color: var(--editor-primary, #2563eb);
}
[data-field-ref][data-edit-state="pending"] {
    opacity: 0.6;
}

.preview-banner {
    position: fixed;
    bottom: 1rem;
    left: 1rem;
    z-index: 9000;
    padding: 0.5rem 1rem;
    border-radius: 6px;
    background: #111827;
    color: #f9fafb;
    font: 13px system-ui, sans-serif;
}
.preview-banner a { color: #93c5fd; margin-left: 0.75rem; }

.preview-login {
    position: fixed;
    inset: 0;
    z-index: 9500;
    display: flex;
    align-items: center;
    justify-content: center;
    background: rgba(17, 24, 39, 0.55);
    font-family: system-ui, sans-serif;
}
.preview-login form {
    background: #fff;
    color: #111827;
    padding: 1.5rem;
    border-radius: 10px;
    min-width: 18rem;
    display: flex;
    flex-direction: column;
    gap: 0.75rem;
}
.preview-login input { padding: 0.5rem; font-size: 1rem; }

.preview-overlay {
    position: fixed;
    inset: 0;
    z-index: 10000;
    display: flex;
    align-items: center;
    justify-content: center;
    background: rgba(0, 0, 0, 0.45);
    font-family: system-ui, sans-serif;
}
.preview-modal {
    width: min(36rem, 92vw);
    max-height: 90vh;
    overflow: auto;
    background: var(--editor-surface, #fff);
    color: var(--editor-text, #111827);
    border: 1px solid var(--editor-border, #e5e7eb);
    border-radius: 12px;
    box-shadow: 0 20px 50px var(--editor-shadow, rgba(0, 0, 0, 0.25));
}
.preview-modal header {
    display: flex;
    align-items: center;
    justify-content: space-between;
    padding: 1rem 1.25rem;
    border-bottom: 1px solid var(--editor-border, #e5e7eb);
}
.preview-modal h2 { margin: 0; font-size: 1.1rem; }
.preview-close {
    border: none;
    background: none;
    font-size: 1.5rem;
    color: var(--editor-text-muted, #6b7280);
    cursor: pointer;
}
.preview-form { display: flex; flex-direction: column; gap: 1rem; padding: 1.25rem; }
.preview-field { display: flex; flex-direction: column; gap: 0.35rem; }
.preview-field label { font-size: 0.85rem; color: var(--editor-text-muted, #6b7280); }
.preview-field input,
.preview-field textarea,
.preview-field select {
    padding: 0.55rem 0.7rem;
    font: inherit;
    color: var(--editor-text, #111827);
    background: var(--editor-bg, #fff);
    border: 1px solid var(--editor-border, #d1d5db);
    border-radius: 6px;
}
.preview-field textarea { resize: vertical; line-height: 1.5; }
.preview-image-preview { max-width: 100%; max-height: 12rem; border-radius: 6px; object-fit: cover; }
.preview-error {
    margin: 0;
    padding: 0.5rem 0.75rem;
    border-radius: 6px;
    background: var(--editor-surface, #fef2f2);
    color: var(--editor-error, #b91c1c);
}
.preview-actions { display: flex; justify-content: flex-end; gap: 0.75rem; }
.preview-actions button {
    padding: 0.55rem 1.1rem;
    border-radius: 6px;
    font: inherit;
    cursor: pointer;
}
.preview-cancel {
    background: transparent;
    color: var(--editor-text, #111827);
    border: 1px solid var(--editor-border, #d1d5db);
}
.preview-save {
    background: var(--editor-primary, #2563eb);
    color: var(--editor-bg, #fff);
    border: none;
}
.preview-save[disabled] { opacity: 0.6; cursor: progress; }
"#;
