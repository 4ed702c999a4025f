//! In-process script host backed by an embedded JavaScript engine.
//!
//! `NativeHost` creates [`boa_engine`] contexts. Each context is bootstrapped
//! with a `__nativeModule(name)` loader that hands out the Rust rewriters as
//! native functions, so libraries are injected as ordinary JavaScript:
//!
//! ```text
//! var native = __nativeModule("dom-rewriter");
//! native.turndown(html, configJson, keepJson, removeJson);
//! ```
//!
//! Every context remembers the host generation it was created in.
//! [`NativeHost::invalidate_contexts`] bumps the generation, after which older
//! contexts throw on every call, the way a crashed renderer process leaves
//! its handles dangling.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use boa_engine::{
    js_string, Context, JsError, JsNativeError, JsResult, JsString, JsValue, NativeFunction,
    Source,
};
use dom_rewriter::{
    CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle, MarkdownStyle, TurndownService,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use string_rewriter::TranslateOptions;
use tracing::debug;

use super::{ContextFactory, ScriptContext, ScriptException, ScriptValue};

/// Moves the raw native functions behind `__nativeModule` and off the global
/// object
const BOOTSTRAP: &str = r#"
(function (global) {
  var modules = {
    "dom-rewriter": Object.freeze({
      turndown: global.__domTurndown,
      escape: global.__domEscape
    }),
    "string-rewriter": global.__stringTranslate
  };
  delete global.__domTurndown;
  delete global.__domEscape;
  delete global.__stringTranslate;

  global.__nativeModule = function (name) {
    if (!Object.prototype.hasOwnProperty.call(modules, name)) {
      throw new Error("Cannot find module '" + name + "'");
    }
    return modules[name];
  };
})(globalThis);
"#;

const BLANK_DOCUMENT: &str =
    "globalThis.document = { nodeType: 9, documentElement: null, body: null };";

/// Creates [`NativeContext`]s. Clones share one generation counter.
#[derive(Debug, Clone, Default)]
pub struct NativeHost {
    generation: Arc<AtomicU64>,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down every context created so far
    pub fn invalidate_contexts(&self) {
        let previous = self.generation.fetch_add(1, Ordering::SeqCst);
        debug!(generation = previous + 1, "native contexts invalidated");
    }
}

impl ContextFactory for NativeHost {
    type Context = NativeContext;

    fn create_context(&self) -> Result<NativeContext, ScriptException> {
        let mut context = Context::default();
        install_native_modules(&mut context).map_err(|err| exception(err, &mut context))?;

        Ok(NativeContext {
            host_generation: Arc::clone(&self.generation),
            generation: self.generation.load(Ordering::SeqCst),
            context,
        })
    }
}

/// A context created by [`NativeHost`]. Not `Send`: it stays on the thread
/// that created it.
pub struct NativeContext {
    host_generation: Arc<AtomicU64>,
    generation: u64,
    context: Context,
}

impl NativeContext {
    fn ensure_alive(&self) -> Result<(), ScriptException> {
        if self.host_generation.load(Ordering::SeqCst) == self.generation {
            Ok(())
        } else {
            Err(ScriptException::new(
                "Error: execution context was destroyed",
            ))
        }
    }

    fn eval(&mut self, source: &str) -> Result<JsValue, ScriptException> {
        self.ensure_alive()?;
        self.context
            .eval(Source::from_bytes(source))
            .map_err(|err| exception(err, &mut self.context))
    }
}

impl ScriptContext for NativeContext {
    fn evaluate(&mut self, source: &str) -> Result<ScriptValue, ScriptException> {
        self.eval(source).map(|value| script_value(&value))
    }

    fn load_blank_document(&mut self) -> Result<(), ScriptException> {
        self.eval(BLANK_DOCUMENT).map(|_| ())
    }
}

impl fmt::Debug for NativeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeContext")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

fn install_native_modules(context: &mut Context) -> JsResult<()> {
    context.register_global_callable(
        js_string!("__domTurndown"),
        4,
        NativeFunction::from_fn_ptr(dom_turndown),
    )?;
    context.register_global_callable(
        js_string!("__domEscape"),
        1,
        NativeFunction::from_fn_ptr(dom_escape),
    )?;
    context.register_global_callable(
        js_string!("__stringTranslate"),
        2,
        NativeFunction::from_fn_ptr(string_translate),
    )?;
    context.eval(Source::from_bytes(BOOTSTRAP))?;
    Ok(())
}

/// `Kind: message` for native errors, the thrown value otherwise
fn exception(err: JsError, context: &mut Context) -> ScriptException {
    let message = match err.try_native(context) {
        Ok(native) => native.to_string(),
        Err(_) => err.to_string(),
    };
    ScriptException::new(message)
}

fn script_value(value: &JsValue) -> ScriptValue {
    if value.is_undefined() {
        ScriptValue::Undefined
    } else if value.is_null() {
        ScriptValue::Null
    } else if let Some(b) = value.as_boolean() {
        ScriptValue::Bool(b)
    } else if let Some(n) = value.as_number() {
        ScriptValue::Number(n)
    } else if let Some(s) = value.as_string() {
        ScriptValue::String(s.to_std_string_escaped())
    } else {
        ScriptValue::Object {
            callable: value.is_callable(),
        }
    }
}

fn string_arg(args: &[JsValue], index: usize, name: &str) -> JsResult<String> {
    args.get(index)
        .and_then(JsValue::as_string)
        .map(JsString::to_std_string_escaped)
        .ok_or_else(|| {
            JsNativeError::typ()
                .with_message(format!("{name} must be a string"))
                .into()
        })
}

fn json_arg<T: DeserializeOwned>(args: &[JsValue], index: usize, name: &str) -> JsResult<T> {
    let json = string_arg(args, index, name)?;
    serde_json::from_str(&json).map_err(|err| {
        JsNativeError::typ()
            .with_message(format!("invalid {name}: {err}"))
            .into()
    })
}

fn string_result(s: String) -> JsValue {
    JsString::from(s.as_str()).into()
}

/// Constructor options of the DOM rewriter, as turndown spells them
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DomConfig {
    heading_style: Option<String>,
    hr: Option<String>,
    bullet_list_marker: Option<String>,
    code_block_style: Option<String>,
    fence: Option<String>,
    em_delimiter: Option<String>,
    strong_delimiter: Option<String>,
    link_style: Option<String>,
    link_reference_style: Option<String>,
}

impl DomConfig {
    fn into_style(self) -> MarkdownStyle {
        let mut style = MarkdownStyle::default();
        if let Some(heading) = self.heading_style {
            style.heading_style = match heading.as_str() {
                "setext" => HeadingStyle::Setext,
                _ => HeadingStyle::Atx,
            };
        }
        if let Some(hr) = self.hr {
            style.hr = hr;
        }
        if let Some(marker) = self.bullet_list_marker.and_then(|m| m.chars().next()) {
            style.bullet_list_marker = marker;
        }
        if let Some(code) = self.code_block_style {
            style.code_block_style = match code.as_str() {
                "fenced" => CodeBlockStyle::Fenced,
                _ => CodeBlockStyle::Indented,
            };
        }
        if let Some(fence) = self.fence {
            style.fence = fence;
        }
        if let Some(em) = self.em_delimiter.and_then(|m| m.chars().next()) {
            style.em_delimiter = em;
        }
        if let Some(strong) = self.strong_delimiter {
            style.strong_delimiter = strong;
        }
        if let Some(link) = self.link_style {
            style.link_style = match link.as_str() {
                "referenced" => LinkStyle::Referenced,
                _ => LinkStyle::Inlined,
            };
        }
        if let Some(reference) = self.link_reference_style {
            style.link_reference_style = match reference.as_str() {
                "collapsed" => LinkReferenceStyle::Collapsed,
                "shortcut" => LinkReferenceStyle::Shortcut,
                _ => LinkReferenceStyle::Full,
            };
        }
        style
    }
}

/// `turndown(html, configJson, keepJson, removeJson)`
fn dom_turndown(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let html = string_arg(args, 0, "html")?;
    let config: DomConfig = json_arg(args, 1, "options")?;
    let keep: Vec<String> = json_arg(args, 2, "keep filter")?;
    let remove: Vec<String> = json_arg(args, 3, "remove filter")?;

    let mut service = TurndownService::with_style(config.into_style());
    service.keep(keep).remove(remove);
    Ok(string_result(service.turndown(&html)))
}

fn dom_escape(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let text = string_arg(args, 0, "text")?;
    Ok(string_result(TurndownService::new().escape(&text)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StringConfig {
    skip_tags: Vec<String>,
    ignore_tags: Vec<String>,
    empty_tags: Vec<String>,
    bullet_marker: Option<String>,
}

/// `translate(html, optionsJson)`
fn string_translate(
    _this: &JsValue,
    args: &[JsValue],
    _context: &mut Context,
) -> JsResult<JsValue> {
    let html = string_arg(args, 0, "html")?;
    let config: StringConfig = json_arg(args, 1, "options")?;

    let mut options = TranslateOptions::default()
        .with_skip_tags(config.skip_tags)
        .with_ignore_tags(config.ignore_tags)
        .with_empty_tags(config.empty_tags);
    if let Some(marker) = config.bullet_marker.and_then(|m| m.chars().next()) {
        options = options.with_bullet_marker(marker);
    }

    string_rewriter::translate(&html, &options)
        .map(string_result)
        .map_err(|err| JsNativeError::error().with_message(err.to_string()).into())
}
