//! JavaScript evaluated in the page.
//!
//! Every script evaluates to a primitive; structured results come back as
//! JSON strings so they survive `Runtime.evaluate` without `returnByValue`.
//!
//! The `*_FUNCTION` constants are function expressions called with one JSON
//! request. Each request names the frame it targets by its `window.frames`
//! path from the top window; the function resolves that window and shadows
//! `document` with the frame's own.

use crate::core::NodeId;
use crate::dom::Mutation;
use crate::errors::Result;
use crate::marker::overlay::{border_id, label_id, BORDER_PREFIX, LABEL_PREFIX};
use serde::{Deserialize, Serialize};

/// Lists the same-origin documents of the page, top first, depth first.
/// Cross-origin frames throw on `document` access and are skipped.
pub const FRAMES_SCRIPT: &str = r#"// page-marker:frames
(function() {
    const frames = [];
    function visit(win, path) {
        let doc = null;
        try {
            doc = win.document;
        } catch (e) {
            return;
        }
        if (!doc) {
            return;
        }
        frames.push({ path: path, name: win.name || win.location.href });
        for (let i = 0; i < win.frames.length; i++) {
            visit(win.frames[i], path.concat([i]));
        }
    }
    visit(window, []);
    return JSON.stringify(frames);
})()"#;

/// Captures every element of one frame with its geometry, computed style,
/// surrounding text and the `elementFromPoint` results at the sample points
/// the classifiers use. The captured elements stay on the frame's
/// `window.__pageMarkerNodes` until replay.
pub const CAPTURE_FUNCTION: &str = r#"// page-marker:capture
(function(request) {
    let win = window;
    for (const step of request.frame) {
        win = win.frames[step];
    }
    const document = win.document;
    const all = Array.from(document.querySelectorAll('*'));
    const index = new Map(all.map((element, i) => [element, i]));
    win.__pageMarkerNodes = all;

    const body = document.body;
    const scrollX = win.scrollX;
    const scrollY = win.scrollY;
    const probes = [];

    function probe(x, y) {
        const hit = document.elementFromPoint(x - scrollX, y - scrollY);
        probes.push({
            x: x - scrollX,
            y: y - scrollY,
            hit: hit && index.has(hit) ? index.get(hit) : null
        });
    }

    function textRun(start) {
        let text = '';
        for (let node = start; node && node.nodeType !== Node.ELEMENT_NODE; node = node.previousSibling) {
            if (node.nodeType === Node.TEXT_NODE) {
                text = node.data + text;
            }
        }
        return text;
    }

    const nodes = all.map((element) => {
        const rect = element.getBoundingClientRect();
        const style = win.getComputedStyle(element);
        const attributes = {};
        for (const attr of element.attributes) {
            attributes[attr.name] = attr.value;
        }

        if (body && body !== element && body.contains(element) && rect.width >= 2 && rect.height >= 2) {
            const left = rect.left + scrollX;
            const top = rect.top + scrollY;
            const right = rect.right + scrollX;
            const bottom = rect.bottom + scrollY;
            probe(left, top);
            probe(right, top);
            probe(left, bottom);
            probe(right, bottom);
            probe(left + rect.width / 2, top + rect.height / 2);
        }

        const parent = element.parentElement;
        const zIndex = parseInt(style.zIndex, 10);
        return {
            tag: element.tagName,
            parent: parent && index.has(parent) ? index.get(parent) : null,
            attributes: attributes,
            rect: {
                top: rect.top,
                left: rect.left,
                right: rect.right,
                bottom: rect.bottom,
                width: rect.width,
                height: rect.height
            },
            client_rect_count: element.getClientRects().length,
            offset_width: typeof element.offsetWidth === 'number' ? element.offsetWidth : null,
            offset_height: typeof element.offsetHeight === 'number' ? element.offsetHeight : null,
            style: {
                display: style.display,
                visibility: style.visibility,
                cursor: style.cursor,
                pointer_events: style.pointerEvents
            },
            z_index: Number.isNaN(zIndex) ? 0 : zIndex,
            has_click_handler: element.onclick != null,
            text_before: textRun(element.previousSibling),
            trailing_text: textRun(element.lastChild)
        };
    });

    return JSON.stringify({
        url: win.location.href,
        title: document.title,
        scroll_x: scrollX,
        scroll_y: scrollY,
        viewport_width: document.documentElement.clientWidth,
        viewport_height: document.documentElement.clientHeight,
        nodes: nodes,
        probes: probes
    });
})"#;

/// Applies the mutations of a pass to the captured elements and returns the
/// final `outerHTML` of the requested ones as a `ReplayReport`. Elements
/// that left the document since capture are not touched and are reported
/// as stale.
pub const REPLAY_FUNCTION: &str = r#"// page-marker:replay
(function(request) {
    let win = window;
    for (const step of request.frame) {
        win = win.frames[step];
    }
    const document = win.document;
    const nodes = win.__pageMarkerNodes || [];
    const stale = new Set();

    for (const mutation of request.mutations) {
        if (mutation.op === 'set_attribute') {
            const element = nodes[mutation.node];
            if (!element || !element.isConnected) {
                stale.add(mutation.node);
                continue;
            }
            element.setAttribute(mutation.name, mutation.value);
        } else if (mutation.op === 'append') {
            const overlay = mutation.overlay;
            const element = document.createElement('div');
            element.id = overlay.element_id;
            if (overlay.text != null) {
                element.textContent = overlay.text;
            }
            for (const [name, value] of overlay.style) {
                element.style.setProperty(name, value);
            }
            document.body.appendChild(element);
            nodes[mutation.node] = element;
        } else if (mutation.op === 'detach') {
            const element = nodes[mutation.node];
            if (element && element.parentNode) {
                element.parentNode.removeChild(element);
            }
        }
    }

    const markup = request.markup.map((node) => {
        const element = nodes[node];
        if (!element || !element.isConnected) {
            stale.add(node);
            return null;
        }
        return element.outerHTML;
    });
    delete win.__pageMarkerNodes;
    return JSON.stringify({ markup: markup, stale: Array.from(stale) });
})"#;

/// Removes every element under `body` whose id starts with one of the
/// request's prefixes; evaluates to the number removed.
pub const CLEANUP_FUNCTION: &str = r#"// page-marker:cleanup
(function(request) {
    let win = window;
    for (const step of request.frame) {
        win = win.frames[step];
    }
    const document = win.document;
    let removed = 0;
    document.querySelectorAll('body *').forEach((element) => {
        const id = typeof element.id === 'string' ? element.id : '';
        if (request.prefixes.some((prefix) => id.startsWith(prefix))) {
            element.parentNode.removeChild(element);
            removed++;
        }
    });
    return removed;
})"#;

/// Recolors the border and badge of one marked element; evaluates to
/// whether both were found.
pub const RECOLOR_FUNCTION: &str = r#"// page-marker:recolor
(function(request) {
    let win = window;
    for (const step of request.frame) {
        win = win.frames[step];
    }
    const document = win.document;
    const border = document.getElementById(request.border_id);
    const label = document.getElementById(request.label_id);
    if (border) {
        border.style.borderColor = request.border_color;
    }
    if (label) {
        label.style.backgroundColor = request.label_color;
    }
    return Boolean(border && label);
})"#;

/// Replaces `window.showOpenFilePicker` with a plain file input so a headless
/// controller can supply files without an OS dialog. Registered as an init
/// script, so it runs before page scripts in every new document.
pub const FILE_CHOOSER_OVERRIDE: &str = r#"// page-marker:file-chooser
(function() {
    window.showOpenFilePicker = function(options) {
        options = options || {};
        return new Promise((resolve) => {
            const input = document.createElement('input');
            input.type = 'file';
            input.multiple = Boolean(options.multiple);
            input.accept = (options.types || [])
                .map((type) => type.accept || {})
                .flatMap((accept) => Object.keys(accept).flatMap((mime) => accept[mime]))
                .join(',');

            input.addEventListener('change', () => {
                resolve(Array.from(input.files).map((file) => ({
                    getFile: async () => file
                })));
            });

            input.click();
        });
    };
    return true;
})()"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub frame: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRequest {
    pub frame: Vec<usize>,
    pub mutations: Vec<Mutation>,
    /// Elements whose final markup should be returned, in order.
    pub markup: Vec<NodeId>,
}

/// What the replay found in the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayReport {
    /// One entry per requested element; `None` when it could not be read.
    pub markup: Vec<Option<String>>,
    /// Captured elements that were no longer attached to the document.
    #[serde(default)]
    pub stale: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupRequest {
    pub frame: Vec<usize>,
    pub prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecolorRequest {
    pub frame: Vec<usize>,
    pub border_id: String,
    pub label_id: String,
    pub border_color: String,
    pub label_color: String,
}

fn call<T: Serialize>(function: &str, request: &T) -> Result<String> {
    Ok(format!("{}({})", function, serde_json::to_string(request)?))
}

pub fn capture_script(frame: &[usize]) -> Result<String> {
    call(
        CAPTURE_FUNCTION,
        &CaptureRequest {
            frame: frame.to_vec(),
        },
    )
}

pub fn replay_script(request: &ReplayRequest) -> Result<String> {
    call(REPLAY_FUNCTION, request)
}

/// Removes every border and badge of one frame.
pub fn cleanup_script(frame: &[usize]) -> Result<String> {
    call(
        CLEANUP_FUNCTION,
        &CleanupRequest {
            frame: frame.to_vec(),
            prefixes: vec![BORDER_PREFIX.to_string(), LABEL_PREFIX.to_string()],
        },
    )
}

/// Sets the border color and badge background of marked element `id`.
pub fn recolor_script(
    frame: &[usize],
    id: usize,
    border_color: &str,
    label_color: &str,
) -> Result<String> {
    call(
        RECOLOR_FUNCTION,
        &RecolorRequest {
            frame: frame.to_vec(),
            border_id: border_id(id),
            label_id: label_id(id),
            border_color: border_color.to_string(),
            label_color: label_color.to_string(),
        },
    )
}
