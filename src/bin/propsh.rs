//! Property store shell
//!
//! Interactive shell over a single array object, for poking at sparse
//! storage, length handling and promotion by hand.
//!
//! Usage: `propsh [--min-slots N] [--max-gap N]`. Set `RUST_LOG=debug` to
//! watch representation swaps.

use indexed_store::runtime::ReprKind;
use indexed_store::{
    Context, JsResult, Object, PromotionPolicy, PropertyDescriptor, StoreConfig, Value,
};
use regex::Regex;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  put <key> <value>            assign
  get <key>                    read (runs getters)
  del <key>                    delete
  len [n]                      show or set length
  freeze-len                   make length read-only
  define <key> <value> [nonconfig]
                               define an enumerable data property
  keys                         list own property names (including hidden)
  export                       export the array
  repr                         show the current representation
  policy <min> <gap>           start over with a new promotion policy
  strict on|off                raise (on) or report false (off) on failure
  help, quit";

struct Shell {
    ctx: Context,
    array: Object,
    strict: bool,
    command: Regex,
    number: Regex,
}

impl Shell {
    fn new(policy: PromotionPolicy) -> Result<Self, regex::Error> {
        let ctx = Context::with_config(StoreConfig::default().with_promotion(policy));
        let array = ctx.new_sparse_array();
        Ok(Shell {
            ctx,
            array,
            strict: true,
            command: Regex::new(r"^\s*([a-z-]+)(?:\s+(\S+))?(?:\s+(\S+))?(?:\s+(\S+))?\s*$")?,
            number: Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$")?,
        })
    }

    /// Replace the array with a fresh one under `policy`
    fn reset(&mut self, policy: PromotionPolicy) {
        self.ctx = Context::with_config(self.ctx.config().clone().with_promotion(policy));
        self.array = self.ctx.new_sparse_array();
    }

    fn parse_value(&self, text: &str) -> Value {
        match text {
            "undefined" => Value::Undefined,
            "null" => Value::Null,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ if self.number.is_match(text) => Value::number(text.parse().unwrap_or(f64::NAN)),
            _ => Value::string(text.trim_matches('"')),
        }
    }

    /// Run one command line; `Ok(None)` means nothing to print
    fn execute(&mut self, line: &str) -> Result<Option<String>, String> {
        let Some(caps) = self.command.captures(line) else {
            return Err(format!("cannot parse '{}' (try 'help')", line.trim()));
        };
        let arg = |i: usize| caps.get(i).map(|m| m.as_str());
        let throw = self.strict;

        let result: JsResult<Option<String>> = match (&caps[1], arg(2), arg(3), arg(4)) {
            ("put", Some(key), Some(value), None) => {
                let value = self.parse_value(value);
                self.array
                    .put(&self.parse_value(key), value, throw)
                    .map(|ok| Some(ok.to_string()))
            }
            ("get", Some(key), None, None) => self
                .array
                .get(&self.parse_value(key))
                .map(|v| Some(format!("{:?}", v))),
            ("del", Some(key), None, None) => self
                .array
                .delete(&self.parse_value(key), throw)
                .map(|ok| Some(ok.to_string())),
            ("len", None, None, None) => self.array.get_str("length").map(|v| Some(v.to_string())),
            ("len", Some(n), None, None) => self
                .array
                .put_str("length", self.parse_value(n), throw)
                .map(|ok| Some(ok.to_string())),
            ("freeze-len", None, None, None) => self
                .array
                .define_own_property_str(
                    "length",
                    PropertyDescriptor::default().writable(false),
                    throw,
                )
                .map(|ok| Some(ok.to_string())),
            ("define", Some(key), Some(value), flag) => {
                let configurable = match flag {
                    None => true,
                    Some("nonconfig") => false,
                    Some(other) => return Err(format!("unknown flag '{}'", other)),
                };
                let desc = PropertyDescriptor::data(self.parse_value(value))
                    .enumerable(true)
                    .configurable(configurable);
                self.array
                    .define_own_property(&self.parse_value(key), desc, throw)
                    .map(|ok| Some(ok.to_string()))
            }
            ("keys", None, None, None) => self.array.enumerate(true, false).map(|iter| {
                let names: Vec<String> = iter.map(|item| item.name.to_string()).collect();
                Some(names.join(" "))
            }),
            ("export", None, None, None) => self.array.export().map(|e| Some(format!("{:?}", e))),
            ("repr", None, None, None) => Ok(Some(describe(self.array.repr_kind()).to_string())),
            ("policy", Some(min), Some(gap), None) => {
                let policy = parse_policy(min, gap)?;
                self.reset(policy);
                Ok(Some(format!("new array, {:?}", policy)))
            }
            ("strict", Some(mode), None, None) => {
                self.strict = match mode {
                    "on" => true,
                    "off" => false,
                    other => return Err(format!("expected on or off, got '{}'", other)),
                };
                Ok(None)
            }
            ("help", None, None, None) => Ok(Some(HELP.to_string())),
            (cmd, ..) => return Err(format!("bad command or arguments: {} (try 'help')", cmd)),
        };
        result.map_err(|e| e.to_string())
    }
}

fn describe(kind: ReprKind) -> &'static str {
    match kind {
        ReprKind::Lazy => "lazy",
        ReprKind::Base => "object",
        ReprKind::Sparse => "sparse",
        ReprKind::Dense => "dense",
    }
}

fn parse_policy(min: &str, gap: &str) -> Result<PromotionPolicy, String> {
    let min_slots = min
        .parse()
        .map_err(|e| format!("bad slot count '{}': {}", min, e))?;
    let max_average_gap = gap
        .parse()
        .map_err(|e| format!("bad gap '{}': {}", gap, e))?;
    Ok(PromotionPolicy::new(min_slots, max_average_gap))
}

fn parse_args() -> Result<PromotionPolicy, String> {
    let mut policy = PromotionPolicy::default();
    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| format!("missing value for {}", flag))?;
        match flag.as_str() {
            "--min-slots" => policy = parse_policy(&value, &policy.max_average_gap.to_string())?,
            "--max-gap" => policy = parse_policy(&policy.min_slots.to_string(), &value)?,
            other => return Err(format!("unknown option {}", other)),
        }
    }
    Ok(policy)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let policy = match parse_args() {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("usage: propsh [--min-slots N] [--max-gap N]");
            std::process::exit(2);
        }
    };

    if let Err(e) = run_repl(policy) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_repl(policy: PromotionPolicy) -> Result<(), Box<dyn std::error::Error>> {
    println!("propsh - indexed property store shell");
    println!("Type 'help' for commands, Ctrl+D to exit.\n");

    let mut shell = Shell::new(policy)?;
    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line)?;
        if line == "quit" || line == "exit" {
            break;
        }

        match shell.execute(line) {
            Ok(Some(output)) => println!("{}", output),
            Ok(None) => {}
            Err(e) => println!("Error: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_far_write_and_repr() {
        let mut shell = Shell::new(PromotionPolicy::default()).unwrap();
        assert_eq!(shell.execute("put 1000000 5").unwrap().as_deref(), Some("true"));
        assert_eq!(shell.execute("len").unwrap().as_deref(), Some("1000001"));
        assert_eq!(shell.execute("repr").unwrap().as_deref(), Some("sparse"));
        assert_eq!(shell.execute("get 1000000").unwrap().as_deref(), Some("Number(5)"));
    }

    #[test]
    fn test_blocked_shrink() {
        let mut shell = Shell::new(PromotionPolicy::default()).unwrap();
        for line in ["put 1 a", "put 5 b", "put 9 c", "define 5 b nonconfig"] {
            shell.execute(line).unwrap();
        }
        assert!(shell.execute("len 0").is_err());
        assert_eq!(shell.execute("len").unwrap().as_deref(), Some("6"));
        assert_eq!(shell.execute("keys").unwrap().as_deref(), Some("1 5 length"));

        shell.execute("strict off").unwrap();
        assert_eq!(shell.execute("len 0").unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn test_policy_command() {
        let mut shell = Shell::new(PromotionPolicy::default()).unwrap();
        shell.execute("policy 2 4").unwrap();
        for line in ["put 0 0", "put 1 1", "put 2 2"] {
            shell.execute(line).unwrap();
        }
        assert_eq!(shell.execute("repr").unwrap().as_deref(), Some("dense"));
        assert!(shell.execute("policy x 4").is_err());
    }

    #[test]
    fn test_bad_input() {
        let mut shell = Shell::new(PromotionPolicy::default()).unwrap();
        assert!(shell.execute("PUT 1 2").is_err());
        assert!(shell.execute("put 1").is_err());
        assert!(shell.execute("frobnicate").is_err());
    }
}
