//! Shell command parsing and execution.
//!
//! Commands:
//! - `context` - List the session's top-level models
//! - `get <path>` - Read the value at a dotted path
//! - `set <path> <json>` - Write a JSON value to an attribute or item
//! - `call <path> [json...]` - Call a method with JSON arguments
//! - `keys <path>` - List the attributes, items or keys of an object
//! - `reload` - Fetch the context again and drop cached attributes
//! - `help` - Show help
//! - `exit` - Exit the shell
//!
//! Paths are dotted: the first segment names a model, later segments name
//! attributes, list indices or dict keys, as in `person.friends.0.name`.

use nu_ansi_term::{Color, Style};
use serde_json::Value as JsonValue;

use remirror_core::wire::{Key, ProxyKind};
use remirror_core::{Proxy, Session, Value};

/// Result of executing a command
pub enum CommandResult {
    /// Command succeeded, optionally with output to display
    Ok { display: Option<String> },
    /// Command failed with an error message
    Error(String),
    /// User requested to exit
    Exit,
    /// Show help
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
        }
    }

    fn ok_none() -> Self {
        CommandResult::Ok { display: None }
    }
}

impl<T> From<Result<T, String>> for CommandResult
where
    T: Into<String>,
{
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(display) => CommandResult::ok_display(display),
            Err(message) => CommandResult::Error(message),
        }
    }
}

/// Parse and execute a command
pub fn execute(input: &str, session: &Session) -> CommandResult {
    let input = input.trim();

    if input.is_empty() {
        return CommandResult::ok_none();
    }

    let (cmd, args) = match input.split_once(char::is_whitespace) {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (input, ""),
    };

    match cmd.to_lowercase().as_str() {
        "context" | "ctx" => cmd_context(session).into(),
        "get" | "g" => cmd_get(args, session).into(),
        "set" | "s" => cmd_set(args, session).into(),
        "call" | "c" => cmd_call(args, session).into(),
        "keys" | "ls" => cmd_keys(args, session).into(),
        "reload" => cmd_reload(session).into(),
        "help" | "?" => CommandResult::Help,
        "exit" | "quit" | "q" => CommandResult::Exit,
        _ => CommandResult::Error(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            cmd
        )),
    }
}

/// Format help text
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);

    let mut help = String::new();
    help.push_str(&format!(
        "{}\n\n",
        Style::new().bold().paint("remirror shell commands")
    ));

    let commands = [
        ("context", "", "List top-level models (alias: ctx)"),
        ("get", "<path>", "Read the value at a path (alias: g)"),
        ("set", "<path> <json>", "Write a JSON value (alias: s)"),
        ("call", "<path> [json...]", "Call a method (alias: c)"),
        ("keys", "<path>", "List members of an object (alias: ls)"),
        ("reload", "", "Fetch the context again"),
        ("help", "", "Show this help (alias: ?)"),
        ("exit", "", "Exit the shell (alias: quit, q)"),
    ];

    for (cmd, args, desc) in commands {
        help.push_str(&format!(
            "  {} {} {}\n",
            cmd_style.paint(format!("{:<8}", cmd)),
            arg_style.paint(format!("{:<18}", args)),
            desc
        ));
    }

    help.push_str(&format!(
        "\n{}\n  {}\n",
        Style::new().bold().paint("Paths"),
        "model.attribute.0.key  (indices for lists, keys for dicts)"
    ));
    help
}

fn cmd_context(session: &Session) -> Result<String, String> {
    let context = session
        .get_context()
        .and_then(|context| context.into_ready())
        .map_err(|e| e.to_string())?;

    if context.is_empty() {
        return Ok(Color::Yellow.paint("(no models)").to_string());
    }
    let lines: Vec<String> = context
        .iter()
        .map(|(name, value)| format!("{}  {}", Color::Cyan.bold().paint(name), render(value)))
        .collect();
    Ok(lines.join("\n"))
}

fn cmd_get(args: &str, session: &Session) -> Result<String, String> {
    if args.is_empty() {
        return Err("Usage: get <path>".to_string());
    }
    resolve(session, args).map(|value| render(&value))
}

fn cmd_set(args: &str, session: &Session) -> Result<String, String> {
    let (path, json) = parse_set_args(args).ok_or("Usage: set <path> <json>")?;
    let value: JsonValue =
        serde_json::from_str(json).map_err(|e| format!("Invalid JSON: {}", e))?;

    let (owner, last) = path
        .rsplit_once('.')
        .ok_or_else(|| format!("'{}' names a model, not an attribute", path))?;
    let proxy = resolve_proxy(session, owner)?;
    let key = key_for(&proxy, last)?;
    proxy
        .set_field(key, Value::from(value))
        .map_err(|e| e.to_string())?;

    Ok(Color::Green.paint("ok").to_string())
}

fn cmd_call(args: &str, session: &Session) -> Result<String, String> {
    let (path, rest) = match args.split_once(char::is_whitespace) {
        Some((path, rest)) => (path, rest.trim()),
        None => (args, ""),
    };
    if path.is_empty() {
        return Err("Usage: call <path> [json...]".to_string());
    }
    let arguments = parse_arguments(rest)?;

    let (owner, method) = path
        .rsplit_once('.')
        .ok_or_else(|| format!("'{}' names a model, not a method", path))?;
    let proxy = resolve_proxy(session, owner)?;
    let result = proxy
        .call_method(method, &arguments)
        .map_err(|e| e.to_string())?;

    match result.try_take() {
        Some(outcome) => outcome.map(|value| render(&value)).map_err(|e| e.to_string()),
        None => Ok(Color::Yellow.paint("(pending)").to_string()),
    }
}

fn cmd_keys(args: &str, session: &Session) -> Result<String, String> {
    let proxy = resolve_proxy(session, args)?;

    let mut lines: Vec<String> = proxy
        .keys()
        .iter()
        .map(|key| {
            let marker = if proxy.is_cached(key) { "*" } else { " " };
            format!("{} {}", Color::DarkGray.paint(marker), key)
        })
        .collect();
    lines.extend(
        proxy
            .methods()
            .iter()
            .map(|method| format!("  {}", Color::Cyan.paint(format!("{}()", method)))),
    );
    lines.extend(
        proxy
            .events()
            .iter()
            .map(|event| format!("  {}", Color::Magenta.paint(format!("!{}", event)))),
    );

    if lines.is_empty() {
        return Ok(Color::Yellow.paint("(empty)").to_string());
    }
    Ok(lines.join("\n"))
}

fn cmd_reload(session: &Session) -> Result<String, String> {
    for value in session.context().values() {
        if let Some(proxy) = value.as_proxy() {
            proxy.invalidate_all();
        }
    }
    cmd_context(session)
}

/// Split `set` arguments into the path and the JSON text.
fn parse_set_args(args: &str) -> Option<(&str, &str)> {
    let (path, json) = args.split_once(char::is_whitespace)?;
    let json = json.trim();
    if path.is_empty() || json.is_empty() {
        return None;
    }
    Some((path, json))
}

/// Parse whitespace-separated JSON values.
fn parse_arguments(text: &str) -> Result<Vec<Value>, String> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<JsonValue>()
        .map(|value| {
            value
                .map(Value::from)
                .map_err(|e| format!("Invalid JSON argument: {}", e))
        })
        .collect()
}

/// Walk a dotted path from a model to a value.
fn resolve(session: &Session, path: &str) -> Result<Value, String> {
    let mut segments = path.split('.');
    let name = segments.next().unwrap_or_default();
    let mut value = model(session, name)?;

    let mut walked = name.to_string();
    for segment in segments {
        let proxy = value
            .as_proxy()
            .ok_or_else(|| format!("'{}' is not an object", walked))?
            .clone();
        let key = key_for(&proxy, segment)?;
        value = proxy
            .get_field(key)
            .map_err(|e| e.to_string())?
            .unwrap_or_else(Value::null);
        walked.push('.');
        walked.push_str(segment);
    }
    Ok(value)
}

fn resolve_proxy(session: &Session, path: &str) -> Result<Proxy, String> {
    if path.is_empty() {
        return Err("Expected a path".to_string());
    }
    match resolve(session, path)? {
        Value::Proxy(proxy) => Ok(proxy),
        Value::Primitive(_) => Err(format!("'{}' is not an object", path)),
    }
}

/// Look up a model, fetching the context on first use.
fn model(session: &Session, name: &str) -> Result<Value, String> {
    if let Some(value) = session.model(name) {
        return Ok(value);
    }
    let context = session
        .get_context()
        .and_then(|context| context.into_ready())
        .map_err(|e| e.to_string())?;
    context
        .get(name)
        .cloned()
        .ok_or_else(|| format!("No model named '{}'", name))
}

fn key_for(proxy: &Proxy, segment: &str) -> Result<Key, String> {
    match proxy.kind() {
        ProxyKind::Instance => Ok(Key::from(segment)),
        ProxyKind::List => segment
            .parse::<usize>()
            .map(Key::from)
            .map_err(|_| format!("'{}' is not a list index", segment)),
        ProxyKind::Dict => {
            let name = Key::from(segment);
            if proxy.keys().contains(&name) {
                return Ok(name);
            }
            Ok(segment.parse::<i64>().map(Key::from).unwrap_or(name))
        }
    }
}

/// Render a value for display.
pub fn render(value: &Value) -> String {
    match value {
        Value::Primitive(json) => format_json(json),
        Value::Proxy(proxy) => {
            let label = match (proxy.kind(), proxy.type_name()) {
                (ProxyKind::Instance, Some(type_name)) => type_name,
                (kind, _) => kind.to_string(),
            };
            format!(
                "{} {}",
                Color::Magenta.paint(format!("<{}>", label)),
                Color::DarkGray.paint(format!("#{}", proxy.id()))
            )
        }
    }
}

/// Format JSON with scalar highlighting
fn format_json(value: &JsonValue) -> String {
    match value {
        JsonValue::Null | JsonValue::Bool(_) => Color::Yellow.paint(value.to_string()).to_string(),
        JsonValue::Number(_) => Color::Cyan.paint(value.to_string()).to_string(),
        JsonValue::String(_) => Color::Green.paint(value.to_string()).to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remirror_core::testing::MockRemote;
    use remirror_core::wire::{InstanceInfo, ListInfo, Reference, Request, Response, WireValue};
    use remirror_core::ClientConfig;
    use serde_json::json;

    fn remote() -> MockRemote {
        let person: WireValue = Reference::instance(
            "1",
            InstanceInfo::named("app.Person")
                .with_attributes(["name", "age", "scores"])
                .with_methods(["greet"]),
        )
        .into();
        let scores: WireValue = Reference::list(
            "2",
            ListInfo::with_data(vec![WireValue::primitive(10), WireValue::primitive(20)]),
        )
        .into();
        MockRemote::new()
            .with_response(
                "get_context",
                Response::ok(json!({ "person": person.to_json() })),
            )
            .with_value("get_instance_attribute/1/name", WireValue::primitive("Ann"))
            .with_value("get_instance_attribute/1/scores", scores)
            .with_value("call_instance_method/1/greet", WireValue::primitive("hello, Bob"))
    }

    fn display(result: CommandResult) -> String {
        match result {
            CommandResult::Ok { display } => display.unwrap_or_default(),
            CommandResult::Error(message) => panic!("command failed: {}", message),
            CommandResult::Exit | CommandResult::Help => panic!("unexpected control result"),
        }
    }

    fn session(remote: &MockRemote) -> Session {
        Session::blocking(remote.transport(), ClientConfig::default())
    }

    #[test]
    fn test_parse_set_args() {
        assert_eq!(
            parse_set_args("person.name \"Bob\""),
            Some(("person.name", "\"Bob\""))
        );
        assert_eq!(
            parse_set_args("a.b {\"x\": 1}"),
            Some(("a.b", "{\"x\": 1}"))
        );
        assert_eq!(parse_set_args("person.name"), None);
        assert_eq!(parse_set_args(""), None);
    }

    #[test]
    fn test_parse_arguments() {
        let args = parse_arguments(r#"1 "two" {"three": 3}"#).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[1], Value::from("two"));
        assert!(parse_arguments("").unwrap().is_empty());
        assert!(parse_arguments("{oops").is_err());
    }

    #[test]
    fn test_context_lists_models() {
        let remote = remote();
        let output = display(execute("context", &session(&remote)));
        assert!(output.contains("person"));
        assert!(output.contains("app.Person"));
    }

    #[test]
    fn test_get_attribute_loads_context_on_demand() {
        let remote = remote();
        let output = display(execute("get person.name", &session(&remote)));
        assert!(output.contains("\"Ann\""));
        assert_eq!(remote.count("get_context"), 1);
    }

    #[test]
    fn test_get_list_item() {
        let remote = remote();
        let output = display(execute("get person.scores.1", &session(&remote)));
        assert!(output.contains("20"));
        assert_eq!(remote.count("get_item/2/1"), 0);
    }

    #[test]
    fn test_set_writes_through() {
        let remote = remote();
        let session = session(&remote);
        display(execute("set person.age 31", &session));

        assert!(remote.recorded_requests().contains(&Request::SetInstanceAttribute {
            id: "1".into(),
            attribute_name: "age".to_string(),
            value: WireValue::primitive(31),
        }));
        assert!(display(execute("get person.age", &session)).contains("31"));
        assert_eq!(remote.count("get_instance_attribute/1/age"), 0);
    }

    #[test]
    fn test_call_method() {
        let remote = remote();
        let output = display(execute("call person.greet \"Bob\"", &session(&remote)));
        assert!(output.contains("hello, Bob"));
        assert_eq!(
            remote.recorded_requests().last(),
            Some(&Request::CallInstanceMethod {
                id: "1".into(),
                method_name: "greet".to_string(),
                args: vec![WireValue::primitive("Bob")],
            })
        );
    }

    #[test]
    fn test_keys_lists_members() {
        let remote = remote();
        let output = display(execute("keys person", &session(&remote)));
        assert!(output.contains("name"));
        assert!(output.contains("greet()"));
    }

    #[test]
    fn test_reload_drops_cached_attributes() {
        let remote = remote();
        let session = session(&remote);
        display(execute("get person.name", &session));
        display(execute("reload", &session));
        display(execute("get person.name", &session));
        assert_eq!(remote.count("get_instance_attribute/1/name"), 2);
    }

    #[test]
    fn test_errors_are_reported() {
        let remote = remote();
        let session = session(&remote);
        assert!(matches!(
            execute("get nobody.name", &session),
            CommandResult::Error(message) if message.contains("nobody")
        ));
        assert!(matches!(
            execute("get person.colour", &session),
            CommandResult::Error(_)
        ));
        assert!(matches!(
            execute("set person 1", &session),
            CommandResult::Error(_)
        ));
        assert!(matches!(execute("frobnicate", &session), CommandResult::Error(_)));
    }

    #[test]
    fn test_control_commands() {
        let remote = remote();
        let session = session(&remote);
        assert!(matches!(execute("help", &session), CommandResult::Help));
        assert!(matches!(execute("exit", &session), CommandResult::Exit));
        assert!(matches!(
            execute("   ", &session),
            CommandResult::Ok { display: None }
        ));
        assert!(format_help().contains("context"));
    }
}
