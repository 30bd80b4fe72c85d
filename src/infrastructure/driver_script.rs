//! 注入页面的 DOM 辅助脚本
//!
//! 脚本只在 `window.__jimengBatchDriver` 不存在时安装，页面刷新后会在下一次调用时自动重装。
//! 元素通过数字句柄在 Rust 和页面之间传递。

/// `__OVERLAY__` 会被替换为 JSON 字符串形式的悬浮层选择器
pub const DRIVER_SCRIPT: &str = r#"
if (!window.__jimengBatchDriver) {
  window.__jimengBatchDriver = (() => {
    const OVERLAY = __OVERLAY__;
    const handles = new Map();
    let nextId = 1;

    const id = (el) => {
      if (!el) return null;
      if (!el.__jimengBatchId) {
        el.__jimengBatchId = nextId++;
      }
      handles.set(el.__jimengBatchId, el);
      return el.__jimengBatchId;
    };
    const get = (handle) => handles.get(handle) || null;
    const inOverlay = (el) => !!(OVERLAY && el && el.closest && el.closest(OVERLAY));
    const normalize = (text) => (text || "").replace(/\s+/g, "");

    const isVisible = (el) => {
      if (!el || inOverlay(el)) return false;
      const style = window.getComputedStyle(el);
      if (style.display === "none" || style.visibility === "hidden") return false;
      if (parseFloat(style.opacity) === 0) return false;
      const rect = el.getBoundingClientRect();
      return rect.width > 1 && rect.height > 1;
    };

    const textMatches = (selectors, text) => {
      const target = normalize(text);
      const results = [];
      selectors.forEach((selector) => {
        document.querySelectorAll(selector).forEach((el) => {
          if (inOverlay(el)) return;
          if (normalize(el.textContent).includes(target)) results.push(el);
        });
      });
      return results;
    };

    return {
      location: () => window.location.href,
      readyState: () => document.readyState,
      waitForLoad: () =>
        new Promise((resolve) => {
          if (document.readyState === "complete") return resolve(true);
          window.addEventListener("load", () => resolve(true), { once: true });
        }),
      findVisible: (query) => {
        const candidates = query.css
          ? Array.from(document.querySelectorAll(query.css))
          : textMatches(query.selectors || [], query.text || "");
        const found = candidates.find(isVisible);
        return found ? id(found) : null;
      },
      findAll: (selector) =>
        Array.from(document.querySelectorAll(selector))
          .filter((el) => !inOverlay(el))
          .map(id),
      closest: (handle, selector) => {
        const el = get(handle);
        return el && el.closest ? id(el.closest(selector)) : null;
      },
      findWithin: (handle, selector) => {
        const el = get(handle);
        return el ? id(el.querySelector(selector)) : null;
      },
      firstChild: (handle) => {
        const el = get(handle);
        return el ? id(el.firstElementChild) : null;
      },
      matches: (handle, selector) => {
        const el = get(handle);
        return !!(el && el.matches && el.matches(selector));
      },
      isRendered: (handle) => {
        const el = get(handle);
        return !!(el && el.isConnected && document.body.contains(el) && el.offsetParent !== null);
      },
      ancestors: (handle) => {
        const scopes = [];
        let current = get(handle);
        while (current) {
          scopes.push(id(current));
          current = current.parentElement;
        }
        scopes.push(id(document.body));
        return scopes;
      },
      fileInputs: (handle) => {
        const scope = get(handle);
        if (!scope) return [];
        return Array.from(scope.querySelectorAll('input[type="file"]'))
          .filter((input) => !input.disabled && !inOverlay(input))
          .map((input) => ({ handle: id(input), accept: input.getAttribute("accept") || "" }));
      },
      kind: (handle) => {
        const el = get(handle);
        if (el instanceof HTMLTextAreaElement || el instanceof HTMLInputElement) return "text_control";
        if (el && el.isContentEditable) return "editable";
        return "other";
      },
      nativeClick: (handle) => {
        const el = get(handle);
        if (el && typeof el.click === "function") el.click();
        return true;
      },
      dispatchMouse: (handle, type) => {
        const el = get(handle);
        if (!el) return false;
        el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, composed: true }));
        return true;
      },
      dispatchInput: (handle, type) => {
        const el = get(handle);
        if (!el) return false;
        el.dispatchEvent(new Event(type, { bubbles: true }));
        return true;
      },
      focus: (handle) => {
        const el = get(handle);
        if (!el || typeof el.focus !== "function") return false;
        try {
          el.focus({ preventScroll: true });
        } catch (error) {
          el.focus();
        }
        return true;
      },
      setNativeValue: (handle, value) => {
        const el = get(handle);
        if (!el) return false;
        const prototype = Object.getPrototypeOf(el);
        const descriptor =
          (prototype && Object.getOwnPropertyDescriptor(prototype, "value")) ||
          Object.getOwnPropertyDescriptor(el, "value");
        if (descriptor && descriptor.set) {
          descriptor.set.call(el, value);
        } else {
          el.value = value;
        }
        return true;
      },
      setTextContent: (handle, value) => {
        const el = get(handle);
        if (!el) return false;
        el.textContent = value;
        return true;
      },
      assignFiles: (handle, files) => {
        const input = get(handle);
        if (!input) return 0;
        const transfer = new DataTransfer();
        files.forEach((file) => {
          const binary = atob(file.base64);
          const bytes = new Uint8Array(binary.length);
          for (let i = 0; i < binary.length; i++) bytes[i] = binary.charCodeAt(i);
          transfer.items.add(new File([bytes], file.name, { type: file.mime }));
        });
        input.files = transfer.files;
        return transfer.files.length;
      },
      release: () => {
        handles.clear();
        return true;
      },
    };
  })();
}
"#;

/// 生成带悬浮层选择器的安装脚本
pub fn install_script(overlay_selector: &str) -> String {
    let overlay = serde_json::to_string(overlay_selector).unwrap_or_else(|_| "null".to_string());
    DRIVER_SCRIPT.replace("__OVERLAY__", &overlay)
}
