//! Scripts injected into the page
//!
//! The capture script walks the document and reports raw per-node facts as a
//! flat list in document order. Nodes point at their parent by position, which
//! keeps the JSON shallow no matter how deep the page is.

use serde::Serialize;

use crate::core::Coordinates;

const CAPTURE_SCRIPT: &str = r#"(() => {
  const SKIP = new Set(['script', 'style', 'svg', 'link', 'meta']);
  const CLICK_EVENTS = ['click', 'mousedown', 'mouseup', 'touchstart', 'touchend'];
  const nodes = [];

  const isShadowRoot = (root) => !!root && root.nodeType === 11 && !!root.host;

  function xpathOf(el) {
    const segments = [];
    for (let current = el; current && current.nodeType === 1; current = current.parentNode) {
      let index = 0;
      for (let sib = current.previousSibling; sib; sib = sib.previousSibling) {
        if (sib.nodeType === 1 && sib.nodeName === current.nodeName) index++;
      }
      const name = current.nodeName.toLowerCase();
      segments.unshift(index > 0 ? name + '[' + (index + 1) + ']' : name);
    }
    return segments.join('/');
  }

  function listenerTypes(el) {
    try {
      if (typeof window.getEventListeners === 'function') {
        const map = window.getEventListeners(el) || {};
        return Object.keys(map).filter((type) => map[type] && map[type].length > 0);
      }
    } catch (e) {}
    return CLICK_EVENTS.filter((type) => typeof el['on' + type] === 'function');
  }

  function contains(ancestor, el) {
    for (let cur = el; cur; cur = cur.parentNode) {
      if (cur === ancestor) return true;
    }
    return false;
  }

  function hitTest(el, box, ctx) {
    try {
      const x = box.left + box.width / 2;
      const y = box.top + box.height / 2;
      const root = el.getRootNode();
      if (isShadowRoot(root)) {
        const top = root.elementFromPoint(x, y);
        return !!top && contains(el, top);
      }
      if (ctx.iframe !== null) return null;
      if (x < 0 || y < 0 || x >= window.innerWidth || y >= window.innerHeight) return null;
      const top = document.elementFromPoint(x, y);
      return !!top && contains(el, top);
    } catch (e) {
      return null;
    }
  }

  function textVisible(node, ctx) {
    try {
      const range = ctx.doc.createRange();
      range.selectNodeContents(node);
      const rect = range.getBoundingClientRect();
      const parent = node.parentElement;
      const styled = !parent || typeof parent.checkVisibility !== 'function' ||
        parent.checkVisibility({ checkOpacity: true, checkVisibilityCSS: true });
      return rect.width !== 0 && rect.height !== 0 && styled;
    } catch (e) {
      return false;
    }
  }

  function visit(node, parent, ctx) {
    if (node.nodeType === 3) {
      const text = (node.textContent || '').trim();
      if (text) nodes.push({ type: 'text', parent, text, visible: textVisible(node, ctx) });
      return;
    }
    if (node.nodeType !== 1) return;
    const tag = node.tagName.toLowerCase();
    if (SKIP.has(tag)) return;

    const attributes = {};
    for (const name of node.getAttributeNames()) {
      attributes[name] = node.getAttribute(name) || '';
    }
    const box = node.getBoundingClientRect();
    let style = null;
    try { style = ctx.win.getComputedStyle(node); } catch (e) {}

    const id = nodes.length;
    const record = {
      type: 'element',
      parent,
      tag,
      attributes,
      xpath: xpathOf(node),
      rect: { x: box.left + ctx.offsetX, y: box.top + ctx.offsetY, width: box.width, height: box.height },
      offsetWidth: node.offsetWidth || 0,
      offsetHeight: node.offsetHeight || 0,
      visibility: style ? style.visibility : null,
      display: style ? style.display : null,
      listeners: listenerTypes(node),
      draggable: node.draggable === true,
      hasShadowRoot: !!node.shadowRoot,
      inIframe: ctx.iframe !== null,
      inShadowRoot: isShadowRoot(node.getRootNode()),
      iframeContext: ctx.iframe,
      hit: hitTest(node, box, ctx),
      iframeBlocked: false,
    };
    nodes.push(record);

    if (node.shadowRoot) {
      for (const child of node.shadowRoot.childNodes) visit(child, id, ctx);
    }
    if (tag === 'iframe') {
      try {
        const doc = node.contentDocument || (node.contentWindow && node.contentWindow.document);
        if (!doc || !doc.body) throw new Error('unreadable');
        const inner = {
          doc,
          win: node.contentWindow,
          iframe: record.xpath,
          offsetX: record.rect.x,
          offsetY: record.rect.y,
        };
        for (const child of doc.body.childNodes) visit(child, id, inner);
      } catch (e) {
        record.iframeBlocked = true;
      }
      return;
    }
    for (const child of node.childNodes) visit(child, id, ctx);
  }

  if (!document.body) return null;
  visit(document.body, null, { doc: document, win: window, iframe: null, offsetX: 0, offsetY: 0 });
  return {
    viewport: {
      width: window.innerWidth,
      height: window.innerHeight,
      scrollX: window.scrollX,
      scrollY: window.scrollY,
    },
    nodes,
  };
})()"#;

/// Removes every overlay this crate draws
pub const RESET_HIGHLIGHTS_SCRIPT: &str = r#"(() => {
  for (const id of ['webinspector-highlights', 'webinspector-pointer']) {
    const el = document.getElementById(id);
    if (el) el.remove();
  }
  return true;
})()"#;

const HIGHLIGHT_TEMPLATE: &str = r#"((boxes) => {
  const COLORS = ['#FF0000', '#00AA00', '#0000FF', '#FF8C00', '#800080', '#008080', '#FF69B4', '#4B0082'];
  let container = document.getElementById('webinspector-highlights');
  if (container) container.remove();
  container = document.createElement('div');
  container.id = 'webinspector-highlights';
  Object.assign(container.style, {
    position: 'fixed', top: '0', left: '0', width: '100%', height: '100%',
    pointerEvents: 'none', zIndex: '2147483647',
  });
  for (const b of boxes) {
    const color = COLORS[b.index % COLORS.length];
    const overlay = document.createElement('div');
    Object.assign(overlay.style, {
      position: 'fixed', left: b.x + 'px', top: b.y + 'px',
      width: b.width + 'px', height: b.height + 'px',
      border: '2px solid ' + color, boxSizing: 'border-box',
    });
    const label = document.createElement('div');
    label.textContent = String(b.index);
    Object.assign(label.style, {
      position: 'fixed', left: b.x + 'px', top: Math.max(0, b.y - 16) + 'px',
      background: color, color: 'white', font: '11px monospace', padding: '0 3px',
    });
    container.appendChild(overlay);
    container.appendChild(label);
  }
  document.body.appendChild(container);
  return boxes.length;
})"#;

const POINTER_TEMPLATE: &str = r#"((p) => {
  let dot = document.getElementById('webinspector-pointer');
  if (!dot) {
    dot = document.createElement('div');
    dot.id = 'webinspector-pointer';
    document.body.appendChild(dot);
  }
  Object.assign(dot.style, {
    position: 'fixed', left: (p.x - 10) + 'px', top: (p.y - 10) + 'px',
    width: '20px', height: '20px', borderRadius: '50%',
    background: 'rgba(255, 0, 0, 0.5)', border: '2px solid red',
    pointerEvents: 'none', zIndex: '2147483647',
  });
  return true;
})"#;

/// One numbered overlay box
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HighlightBox {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub fn capture_script() -> &'static str {
    CAPTURE_SCRIPT
}

/// Script drawing numbered boxes over indexed elements
pub fn highlight_script(boxes: &[HighlightBox]) -> String {
    let payload = serde_json::to_string(boxes).unwrap_or_else(|_| "[]".to_string());
    format!("{}({})", HIGHLIGHT_TEMPLATE, payload)
}

/// Script marking where the next pointer action lands
pub fn pointer_script(at: Coordinates) -> String {
    let payload = serde_json::json!({ "x": at.x, "y": at.y });
    format!("{}({})", POINTER_TEMPLATE, payload)
}
