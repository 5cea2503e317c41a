//! Browser side of the preview editor.
//!
//! The script only talks to `/api/preview/*`; classification, form layout,
//! palettes and validation all happen on the server. Writes go through
//! `/api/preview/save`, so the CMS credential never reaches the page.

pub const PREVIEW_SCRIPT: &str = r##"
(function () {
    'use strict';

    const AUTH_ERROR_CLEAR_MS = 2000;
    const OVERLAY_ID = 'preview-editor-overlay';
    const banner = document.querySelector('.preview-banner');
    let authenticated = banner && banner.dataset.authenticated === 'true';
    let ticket = 0;
    let current = null;   // { el, field, type, ticket }
    const paletteCache = new Map();

    // ------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------

    function effectiveBackground(el) {
        for (let node = el; node && node.nodeType === 1; node = node.parentElement) {
            const bg = getComputedStyle(node).backgroundColor;
            if (bg && bg !== 'transparent' && !/rgba\([^)]*,\s*0\)$/.test(bg)) {
                return bg;
            }
            if (node.dataset && node.dataset.bg) {
                return node.dataset.bg;
            }
        }
        return 'rgb(255, 255, 255)';
    }

    async function paletteFor(el) {
        const bg = effectiveBackground(el);
        if (!paletteCache.has(bg)) {
            const response = await fetch('/api/preview/theme?bg=' + encodeURIComponent(bg));
            if (!response.ok) return null;
            paletteCache.set(bg, await response.json());
        }
        return paletteCache.get(bg);
    }

    async function applyPalette(el) {
        try {
            const palette = await paletteFor(el);
            if (!palette) return;
            for (const [name, value] of Object.entries(palette.variables)) {
                el.style.setProperty(name, value);
            }
            el.dataset.editorPalette = palette.palette;
        } catch (e) {
            console.error('Palette error:', e);
        }
    }

    // ------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------

    function showLogin(onSuccess) {
        if (document.querySelector('.preview-login')) return;
        const wrap = document.createElement('div');
        wrap.className = 'preview-login';
        wrap.innerHTML =
            '<form><label for="preview-password">Preview password</label>' +
            '<input type="password" id="preview-password" autocomplete="current-password" required>' +
            '<p class="preview-error" hidden></p>' +
            '<div class="preview-actions"><button type="button" class="preview-cancel">Cancel</button>' +
            '<button type="submit" class="preview-save">Sign in</button></div></form>';
        document.body.appendChild(wrap);

        const form = wrap.querySelector('form');
        const input = wrap.querySelector('input');
        const error = wrap.querySelector('.preview-error');
        let clearTimer = null;
        input.focus();

        wrap.querySelector('.preview-cancel').addEventListener('click', () => wrap.remove());
        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            const response = await fetch('/api/preview/login', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ password: input.value })
            });
            if (response.ok) {
                authenticated = true;
                if (banner) banner.dataset.authenticated = 'true';
                wrap.remove();
                onSuccess();
                return;
            }
            input.value = '';
            error.textContent = await response.text();
            error.hidden = false;
            clearTimeout(clearTimer);
            clearTimer = setTimeout(() => { error.hidden = true; }, AUTH_ERROR_CLEAR_MS);
        });
    }

    // ------------------------------------------------------------------
    // Overlay
    // ------------------------------------------------------------------

    function directText(el) {
        return Array.from(el.childNodes)
            .filter((n) => n.nodeType === 3)
            .map((n) => n.textContent)
            .join('')
            .trim();
    }

    function blockText(el, type) {
        const itemTag = blockItemTag(el);
        if (!itemTag) return el.textContent.trim();
        const sep = type === 'list' ? '\n' : '\n\n';
        return Array.from(el.children)
            .filter((c) => c.tagName.toLowerCase() === itemTag)
            .map((c) => c.textContent.trim())
            .filter((t) => t)
            .join(sep);
    }

    function blockItemTag(el) {
        const tag = el.tagName.toLowerCase();
        if (tag === 'ul' || tag === 'ol') return 'li';
        const children = Array.from(el.children);
        if (children.length && children.every((c) => c.tagName.toLowerCase() === 'p')) return 'p';
        return null;
    }

    function seedFor(el, type) {
        const seed = { value: '', url: '', target: '', label: el.dataset.fieldLabel || '' };
        if (type === 'button' || type === 'menu') {
            const link = el.matches('a, button') ? el : el.querySelector('a, button');
            seed.value = directText(link || el);
            seed.url = (link && link.getAttribute('href')) || '';
            seed.target = (link && link.getAttribute('target')) || '';
        } else if (type === 'image') {
            const img = el.tagName === 'IMG' ? el : el.querySelector('img');
            seed.url = (img && img.getAttribute('src')) || '';
            seed.value = (img && img.getAttribute('alt')) || '';
        } else if (type === 'paragraph' || type === 'list') {
            seed.value = blockText(el, type);
        } else {
            const walker = document.createTreeWalker(el, NodeFilter.SHOW_TEXT);
            const first = walker.nextNode();
            seed.value = first ? first.textContent.trim() : '';
        }
        return seed;
    }

    function closeEditor() {
        const overlay = document.getElementById(OVERLAY_ID);
        if (overlay) overlay.remove();
        document.removeEventListener('keydown', onKeydown);
        current = null;
    }

    function onKeydown(event) {
        if (event.key === 'Escape') closeEditor();
    }

    async function openEditor(el) {
        closeEditor();
        const field = el.dataset.fieldRef;
        const type = el.dataset.fieldType || 'text';
        const seed = seedFor(el, type);
        const params = new URLSearchParams({
            field: field,
            type: type,
            value: seed.value,
            url: seed.url,
            target: seed.target,
            label: seed.label,
            bg: effectiveBackground(el)
        });
        const response = await fetch('/api/preview/editor?' + params.toString());
        if (response.status === 401) {
            authenticated = false;
            showLogin(() => openEditor(el));
            return;
        }
        if (!response.ok) {
            console.error('Editor error:', await response.text());
            return;
        }

        const holder = document.createElement('div');
        holder.innerHTML = await response.text();
        const overlay = holder.firstElementChild;
        document.body.appendChild(overlay);
        current = { el: el, field: field, type: type, ticket: ++ticket };

        overlay.addEventListener('click', (event) => {
            const action = event.target.dataset && event.target.dataset.action;
            if (action === 'outside' && event.target !== overlay) return;
            if (action === 'outside' || action === 'cancel' || action === 'close') closeEditor();
        });
        document.addEventListener('keydown', onKeydown);
        overlay.querySelector('form').addEventListener('submit', (event) => {
            event.preventDefault();
            save(event.target);
        });
        const firstInput = overlay.querySelector('input, textarea, select');
        if (firstInput) firstInput.focus();
    }

    // ------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------

    function showError(form, message) {
        let error = form.querySelector('.preview-error');
        if (!error) {
            error = document.createElement('p');
            error.className = 'preview-error';
            error.setAttribute('role', 'alert');
            form.insertBefore(error, form.querySelector('.preview-actions'));
        }
        error.textContent = message;
    }

    function replaceDirectText(el, text) {
        const node = Array.from(el.childNodes).find((n) => n.nodeType === 3);
        if (node) node.textContent = text; else el.insertBefore(document.createTextNode(text), el.firstChild);
    }

    function refreshContactHref(el, value) {
        if (el.tagName !== 'A') return;
        const href = el.getAttribute('href') || '';
        if (href.startsWith('mailto:')) el.setAttribute('href', 'mailto:' + value.trim());
        else if (href.startsWith('tel:')) el.setAttribute('href', 'tel:' + value.trim().replace(/ /g, ''));
    }

    function applyPayload(el, payload) {
        switch (payload.kind) {
            case 'button':
            case 'menu': {
                const link = el.matches('a, button') ? el : el.querySelector('a, button');
                if (!link) return;
                replaceDirectText(link, payload.text);
                link.setAttribute('href', payload.url);
                if (payload.kind === 'button') link.setAttribute('target', payload.target);
                break;
            }
            case 'image': {
                const img = el.tagName === 'IMG' ? el : el.querySelector('img');
                if (!img) return;
                img.setAttribute('src', payload.url);
                img.setAttribute('alt', payload.alt);
                break;
            }
            case 'blocks': {
                const itemTag = blockItemTag(el);
                if (itemTag) {
                    el.replaceChildren(...payload.entries.map((entry) => {
                        const item = document.createElement(itemTag);
                        item.textContent = entry;
                        return item;
                    }));
                } else {
                    el.textContent = payload.entries.join('\n\n');
                }
                break;
            }
            default: {
                const walker = document.createTreeWalker(el, NodeFilter.SHOW_TEXT);
                const first = walker.nextNode();
                if (first) first.textContent = payload.value.trim();
                else el.insertBefore(document.createTextNode(payload.value.trim()), el.firstChild);
                refreshContactHref(el, payload.value);
            }
        }
    }

    async function save(form) {
        if (!current) return;
        const pending = current;
        const values = {};
        new FormData(form).forEach((value, key) => { values[key] = String(value); });

        const button = form.querySelector('.preview-save');
        button.disabled = true;
        button.textContent = 'Saving…';
        pending.el.dataset.editState = 'pending';

        let response = null;
        try {
            response = await fetch('/api/preview/save', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({
                    field: pending.field,
                    field_type: pending.type,
                    doc_type: (pending.el.closest('[data-doc-type]') || {}).dataset?.docType || null,
                    values: values
                })
            });
        } catch (e) {
            console.error('Save error:', e);
        }

        delete pending.el.dataset.editState;
        if (!current || current.ticket !== pending.ticket) {
            return; // overlay was closed or replaced meanwhile
        }

        if (response && response.ok) {
            const result = await response.json();
            applyPayload(pending.el, result.payload);
            closeEditor();
            return;
        }

        if (response && response.status === 401) {
            authenticated = false;
        }
        const message = response ? await response.text() : 'Could not save your changes. Please try again.';
        showError(form, message);
        button.disabled = false;
        button.textContent = 'Save';
    }

    // ------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------

    document.addEventListener('click', (event) => {
        const el = event.target.closest('[data-field-ref]');
        if (!el || el.closest('#' + OVERLAY_ID)) return;
        event.preventDefault();
        event.stopPropagation();
        if (authenticated) openEditor(el);
        else showLogin(() => openEditor(el));
    }, true);

    document.addEventListener('mouseover', (event) => {
        const el = event.target.closest('[data-field-ref]');
        if (el && !el.dataset.editorPalette) applyPalette(el);
    });
})();
"##;
