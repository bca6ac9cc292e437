use crate::error::ParseWarning;
use once_cell::sync::Lazy;
use regex::Regex;
use rescope_api::{Resource, ResourceKey, ScriptModule, Symbol, SymbolKind};
use std::path::PathBuf;

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^class\s+([A-Za-z_]\w*)\s*[(:]").expect("valid class regex"));
static DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").expect("valid def regex")
});
static CONST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9_]*)\s*(?::[^=]*)?=(?:[^=]|$)").expect("valid constant regex")
});

/// Open block at some indentation. `class` is set for top-level class bodies only.
struct Scope {
    indent: usize,
    class: Option<usize>,
}

/// Tracks whether a line starts inside a bracketed expression or a triple-quoted string.
#[derive(Default)]
struct LineState {
    depth: usize,
    in_triple: Option<&'static str>,
}

impl LineState {
    fn continues(&self) -> bool {
        self.depth > 0 || self.in_triple.is_some()
    }

    fn feed(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if let Some(quote) = self.in_triple {
                match line.get(i..).and_then(|rest| rest.find(quote)) {
                    Some(pos) => {
                        i += pos + 3;
                        self.in_triple = None;
                        continue;
                    }
                    None => return,
                }
            }
            let c = bytes[i];
            match c {
                b'#' => return,
                b'"' | b'\'' => {
                    let triple = if c == b'"' { "\"\"\"" } else { "'''" };
                    if bytes[i..].starts_with(triple.as_bytes()) {
                        self.in_triple = Some(triple);
                        i += 3;
                        continue;
                    }
                    i += 1;
                    while i < bytes.len() && bytes[i] != c {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    i += 1;
                }
                b'(' | b'[' | b'{' => {
                    self.depth += 1;
                    i += 1;
                }
                b')' | b']' | b'}' => {
                    self.depth = self.depth.saturating_sub(1);
                    i += 1;
                }
                _ => i += 1,
            }
        }
    }
}

/// Extracts top-level classes, functions, constants and class methods from script source.
///
/// Line based: no expression evaluation and no import following.
pub struct SymbolIndexer;

impl SymbolIndexer {
    /// Read and index a resource's primary file.
    pub fn index_resource(resource: &Resource, primary_file: &str) -> Result<ScriptModule, ParseWarning> {
        let file = resource.file(primary_file).ok_or_else(|| ParseWarning {
            path: PathBuf::from(primary_file),
            reason: format!("{} has no {}", resource.key, primary_file),
        })?;
        let bytes = std::fs::read(&file.path).map_err(|e| ParseWarning {
            path: file.path.clone(),
            reason: e.to_string(),
        })?;
        let source = String::from_utf8(bytes).map_err(|e| ParseWarning {
            path: file.path.clone(),
            reason: format!("not valid UTF-8: {}", e.utf8_error()),
        })?;
        Ok(Self::index_source(&resource.key, file.content_hash, &source))
    }

    pub fn index_source(key: &ResourceKey, content_hash: u64, source: &str) -> ScriptModule {
        let qualified_path = key.path.to_dotted();
        let lines: Vec<&str> = source.lines().collect();
        let mut symbols: Vec<Symbol> = Vec::new();
        let mut scopes: Vec<Scope> = Vec::new();
        let mut state = LineState::default();

        for (idx, line) in lines.iter().enumerate() {
            let starts_inside = state.continues();
            state.feed(line);
            if starts_inside {
                continue;
            }

            let stripped = line.trim_start();
            if stripped.is_empty() || stripped.starts_with('#') {
                continue;
            }
            let indent = indent_width(line);
            while scopes.last().is_some_and(|s| indent <= s.indent) {
                scopes.pop();
            }
            let at_top = scopes.is_empty();
            let class_scope = match scopes.last() {
                Some(Scope {
                    class: Some(class), ..
                }) => Some(*class),
                _ => None,
            };
            let line_no = idx + 1;

            if let Some(caps) = CLASS_RE.captures(stripped) {
                let class = at_top.then(|| {
                    let name = &caps[1];
                    symbols.push(Symbol {
                        kind: SymbolKind::Class,
                        name: name.to_string(),
                        qualified_name: format!("{}.{}", qualified_path, name),
                        definition_line: line_no,
                        signature: None,
                        owner: None,
                    });
                    symbols.len() - 1
                });
                scopes.push(Scope { indent, class });
                continue;
            }

            if let Some(caps) = DEF_RE.captures(stripped) {
                let name = caps[1].to_string();
                let open = (line.len() - stripped.len()) + caps[0].len() - 1;
                let (raw, closed) = collect_params(&lines[idx..], open);
                if !closed {
                    tracing::debug!("{}:{} unterminated parameter list", qualified_path, line_no);
                }

                if at_top {
                    symbols.push(Symbol {
                        kind: SymbolKind::Function,
                        qualified_name: format!("{}.{}", qualified_path, name),
                        name,
                        definition_line: line_no,
                        signature: Some(normalize_params(&raw, false)),
                        owner: None,
                    });
                } else if let Some(class) = class_scope {
                    let signature = normalize_params(&raw, true);
                    if name == "__init__" {
                        symbols[class].signature = Some(signature);
                    } else {
                        symbols.push(Symbol {
                            kind: SymbolKind::Method,
                            qualified_name: format!("{}.{}", symbols[class].qualified_name, name),
                            name,
                            definition_line: line_no,
                            signature: Some(signature),
                            owner: Some(class),
                        });
                    }
                }
                scopes.push(Scope {
                    indent,
                    class: None,
                });
                continue;
            }

            if at_top {
                if let Some(caps) = CONST_RE.captures(stripped) {
                    let name = &caps[1];
                    symbols.push(Symbol {
                        kind: SymbolKind::Constant,
                        name: name.to_string(),
                        qualified_name: format!("{}.{}", qualified_path, name),
                        definition_line: line_no,
                        signature: None,
                        owner: None,
                    });
                }
            }
        }

        ScriptModule {
            qualified_path,
            resource: key.clone(),
            content_hash,
            symbols,
        }
    }
}

fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            _ => break,
        }
    }
    width
}

/// Parameter text of the call opened at byte `open` of `lines[0]`, possibly spanning lines.
/// The flag is false when the closing parenthesis was never found.
fn collect_params(lines: &[&str], open: usize) -> (String, bool) {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (n, line) in lines.iter().enumerate() {
        let text = if n == 0 { line.get(open..).unwrap_or("") } else { line };
        let mut escaped = false;
        for ch in text.chars() {
            if let Some(q) = quote {
                out.push(ch);
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                continue;
            }
            match ch {
                '#' => break,
                '\'' | '"' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    if depth > 1 {
                        out.push(ch);
                    }
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return (out, true);
                    }
                    out.push(ch);
                }
                _ => out.push(ch),
            }
        }
        out.push(' ');
    }
    (out, false)
}

/// Comma-separated parameters with whitespace collapsed. Drops a leading `self`/`cls`
/// when `drop_receiver` is set.
fn normalize_params(raw: &str, drop_receiver: bool) -> String {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in raw.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => params.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    params.push(current);

    let mut params: Vec<String> = params
        .iter()
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();

    if drop_receiver {
        let is_receiver = params
            .first()
            .map(|p| {
                let name = p.split([':', '=']).next().unwrap_or("").trim();
                name == "self" || name == "cls"
            })
            .unwrap_or(false);
        if is_receiver {
            params.remove(0);
        }
    }
    params.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescope_api::{ResourcePath, ResourceTypeId};

    fn index(source: &str) -> ScriptModule {
        let key = ResourceKey::new(
            ResourceTypeId::from_static("script-python"),
            ResourcePath::new("utils/helpers"),
        );
        SymbolIndexer::index_source(&key, 0, source)
    }

    fn names(module: &ScriptModule) -> Vec<(SymbolKind, &str)> {
        module
            .symbols
            .iter()
            .map(|s| (s.kind, s.name.as_str()))
            .collect()
    }

    #[test]
    fn test_top_level_symbols() {
        let module = index(
            "import system\n\
             \n\
             MAX_RETRIES = 3\n\
             lower = 1\n\
             \n\
             class Logger(object):\n\
             \x20   LEVEL = 'info'\n\
             \x20   def __init__(self, level):\n\
             \x20       self.level = level\n\
             \n\
             \x20   def log(self, msg, *args):\n\
             \x20       def inner():\n\
             \x20           pass\n\
             \x20       return msg\n\
             \n\
             def get_logger(name='root'):\n\
             \x20   return Logger(name)\n",
        );

        assert_eq!(module.qualified_path, "utils.helpers");
        assert_eq!(
            names(&module),
            vec![
                (SymbolKind::Constant, "MAX_RETRIES"),
                (SymbolKind::Class, "Logger"),
                (SymbolKind::Method, "log"),
                (SymbolKind::Function, "get_logger"),
            ]
        );

        let logger = module.symbol("Logger").unwrap();
        assert_eq!(logger.definition_line, 6);
        assert_eq!(logger.signature.as_deref(), Some("level"));
        assert_eq!(logger.call_style().as_deref(), Some("utils.helpers.Logger(level)"));

        let log = &module.symbols[2];
        assert_eq!(log.qualified_name, "utils.helpers.Logger.log");
        assert_eq!(log.signature.as_deref(), Some("msg, *args"));
        assert_eq!(log.owner, Some(1));

        let get_logger = module.symbol("get_logger").unwrap();
        assert_eq!(get_logger.signature.as_deref(), Some("name='root'"));
        assert_eq!(get_logger.definition_line, 16);
    }

    #[test]
    fn test_multiline_signature() {
        let module = index(
            "def connect(host,\n\
             \x20           port=8080,\n\
             \x20           opts={'a': (1, 2)}):\n\
             \x20   pass\n\
             RETRY = 2\n",
        );
        let connect = module.symbol("connect").unwrap();
        assert_eq!(
            connect.signature.as_deref(),
            Some("host, port=8080, opts={'a': (1, 2)}")
        );
        assert_eq!(module.symbol("RETRY").unwrap().definition_line, 5);
    }

    #[test]
    fn test_docstrings_and_brackets_do_not_leak_structure() {
        let module = index(
            "\"\"\"\n\
             def not_a_function():\n\
             \"\"\"\n\
             CONFIG = {\n\
             \x20   'key': 1,\n\
             }\n\
             def real():\n\
             \x20   '''\n\
             class Nope:\n\
             \x20   '''\n\
             \x20   pass\n",
        );
        assert_eq!(
            names(&module),
            vec![(SymbolKind::Constant, "CONFIG"), (SymbolKind::Function, "real")]
        );
    }

    #[test]
    fn test_nested_classes_are_not_symbols() {
        let module = index(
            "class Outer:\n\
             \x20   class Inner:\n\
             \x20       def hidden(self):\n\
             \x20           pass\n\
             \x20   def visible(self):\n\
             \x20       pass\n",
        );
        assert_eq!(
            names(&module),
            vec![(SymbolKind::Class, "Outer"), (SymbolKind::Method, "visible")]
        );
    }

    #[test]
    fn test_comparison_is_not_constant() {
        let module = index("FLAG == 1\nFLAG2: int = 2\n");
        assert_eq!(names(&module), vec![(SymbolKind::Constant, "FLAG2")]);
    }

    #[test]
    fn test_invalid_utf8_is_parse_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.py");
        std::fs::write(&path, [0x66u8, 0xff, 0xfe]).unwrap();
        let resource = Resource {
            key: ResourceKey::new(
                ResourceTypeId::from_static("script-python"),
                ResourcePath::new("bad"),
            ),
            kind: rescope_api::ResourceKind::Resource,
            origin: Default::default(),
            files: [(
                "code.py".to_string(),
                rescope_api::ResourceFile {
                    path: path.clone(),
                    content_hash: 1,
                },
            )]
            .into_iter()
            .collect(),
            manifest: rescope_api::ManifestState::Missing,
        };
        let warning = SymbolIndexer::index_resource(&resource, "code.py").unwrap_err();
        assert_eq!(warning.path, path);
        assert!(warning.reason.contains("UTF-8"));
    }
}
