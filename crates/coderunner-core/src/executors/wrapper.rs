//! Program templates that make raw submissions self-contained.
//!
//! Every wrapped program follows the same contract:
//!
//! - the request input is bound to `INPUT` as a string literal produced by a JSON
//!   serializer, never by interpolating raw text;
//! - stdout writes go through a small capture shim with its own buffer, and on
//!   normal completion the trimmed buffer is the only thing written to stdout
//!   (for JavaScript that happens when the process exits, so output from
//!   promises, timers and `process.exit(0)` is kept);
//! - an uncaught failure is written to stderr as `Runtime Error: <message>`
//!   followed by the stack or traceback, and the program exits with status 1.
//!
//! JavaScript is spliced verbatim into a top-level `try` block. Python is
//! whitespace-significant, so its source is embedded as a string literal and run
//! through `exec` inside the guard; user indentation is never rewritten.

/// Knobs for the generated capture shim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WrapOptions {
    /// Also forward each captured write to the real stdout immediately.
    pub passthrough: bool,
}

/// Serialize `text` as a double-quoted literal valid in both JavaScript and Python.
pub fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

const JS_SHIM: &str = r#"const __coderunner = (() => {
  const lines = [];
  const realWrite = process.stdout.write.bind(process.stdout);
  const realError = process.stderr.write.bind(process.stderr);
  const render = (value) => {
    if (typeof value === 'string') return value;
    if (typeof value === 'boolean') return String(value);
    if (typeof value === 'object' && value !== null) {
      try {
        const json = JSON.stringify(value);
        return json === undefined ? String(value) : json;
      } catch (_) {
        return String(value);
      }
    }
    return String(value);
  };
  let failed = false;
  let flushed = false;
  return {
    write(...args) {
      const line = args.map(render).join(' ');
      lines.push(line);
      if (PASSTHROUGH) realWrite(line + '\n');
    },
    flush() {
      if (failed || flushed) return;
      flushed = true;
      if (!PASSTHROUGH) realWrite(lines.join('\n').trim());
    },
    fail(error) {
      if (failed) return;
      failed = true;
      const message = error !== null && typeof error === 'object' && 'message' in error
        ? error.message
        : String(error);
      const stack = error !== null && typeof error === 'object' && error.stack
        ? '\n' + error.stack
        : '';
      realError('Runtime Error: ' + message + stack);
      process.exit(1);
    },
  };
})();
console.log = (...args) => __coderunner.write(...args);
console.info = console.log;
process.on('uncaughtException', (error) => __coderunner.fail(error));
process.on('unhandledRejection', (reason) => __coderunner.fail(reason));
// Fires after pending timers and promises settle, and on process.exit().
process.on('exit', () => __coderunner.flush());
"#;

/// Wrap JavaScript source for `node`.
pub fn wrap_javascript(code: &str, input: &str, options: &WrapOptions) -> String {
    let shim = JS_SHIM.replace("PASSTHROUGH", if options.passthrough { "true" } else { "false" });

    let mut program = String::with_capacity(shim.len() + code.len() + input.len() + 128);
    program.push_str(&shim);
    program.push('\n');
    program.push_str("const INPUT = ");
    program.push_str(&string_literal(input));
    program.push_str(";\n\n");
    program.push_str("try {\n");
    program.push_str(code);
    // A trailing line comment in the submission must not swallow the closing brace.
    program.push_str("\n;\n} catch (error) {\n  __coderunner.fail(error);\n}\n");
    program
}

const PY_SHIM: &str = r#"import json as _json
import linecache as _linecache
import sys as _sys
import traceback as _traceback


class _CapturedOutput:
    def __init__(self, real, passthrough):
        self._parts = []
        self._real = real
        self._passthrough = passthrough

    def write(self, text):
        text = str(text)
        self._parts.append(text)
        if self._passthrough:
            self._real.write(text)
        return len(text)

    def writelines(self, lines):
        for line in lines:
            self.write(line)

    def flush(self):
        if self._passthrough:
            self._real.flush()

    def isatty(self):
        return False

    def getvalue(self):
        return "".join(self._parts)

"#;

const PY_RUN: &str = r#"
_real_stdout = _sys.stdout
_capture = _CapturedOutput(_real_stdout, _PASSTHROUGH)
_linecache.cache["<solution>"] = (len(_SOURCE), None, _SOURCE.splitlines(True), "<solution>")
_namespace = {
    "__name__": "__main__",
    "__builtins__": __builtins__,
    "INPUT": INPUT,
    "sys": _sys,
    "json": _json,
}

_sys.stdout = _capture
try:
    exec(compile(_SOURCE, "<solution>", "exec"), _namespace)
except SystemExit as _exit:
    if _exit.code not in (None, 0):
        _sys.stdout = _real_stdout
        _sys.stderr.write("Runtime Error: exited with status {}\n".format(_exit.code))
        _sys.stderr.flush()
        _sys.exit(1)
except Exception as _error:
    _sys.stdout = _real_stdout
    _sys.stderr.write("Runtime Error: {}\n".format(_error))
    _traceback.print_exc()
    _sys.stderr.flush()
    _sys.exit(1)

_sys.stdout = _real_stdout
if not _PASSTHROUGH:
    _real_stdout.write(_capture.getvalue().strip())
_real_stdout.flush()
"#;

/// Wrap Python source for `python3`.
pub fn wrap_python(code: &str, input: &str, options: &WrapOptions) -> String {
    let source = string_literal(code);
    let input = string_literal(input);

    let mut program = String::with_capacity(PY_SHIM.len() + PY_RUN.len() + source.len() + input.len() + 64);
    program.push_str(PY_SHIM);
    program.push('\n');
    program.push_str("INPUT = ");
    program.push_str(&input);
    program.push('\n');
    program.push_str("_SOURCE = ");
    program.push_str(&source);
    program.push('\n');
    program.push_str("_PASSTHROUGH = ");
    program.push_str(if options.passthrough { "True" } else { "False" });
    program.push('\n');
    program.push_str(PY_RUN);
    program
}
