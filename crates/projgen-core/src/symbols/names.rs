//! Native type-name utilities.
//!
//! Symbol backends report fully qualified C++ names such as
//! `ns::Outer<int, std::allocator<int> >::Inner`. Generated code needs
//! dotted, identifier-safe class names and field property names derived from
//! them. Splitting always respects template nesting, so `::` and `,` inside
//! `<...>` never split a name.

/// Split a qualified name into scope components at top-level `::`.
///
/// ```rust
/// use projgen_core::symbols::names::split_scope;
///
/// assert_eq!(split_scope("a::b<c::d>::e"), vec!["a", "b<c::d>", "e"]);
/// ```
pub fn split_scope(name: &str) -> Vec<&str>
{
    let bytes = name.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' => depth += 1,
            b'>' | b')' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                parts.push(name[start..i].trim());
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(name[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Split the text between a template's angle brackets at top-level commas.
pub fn split_arguments(args: &str) -> Vec<&str>
{
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, byte) in args.bytes().enumerate() {
        match byte {
            b'<' | b'(' => depth += 1,
            b'>' | b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = args[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

/// Separate `name<args>` into its base and argument text.
///
/// Anonymous names such as `<unnamed-tag>` have no base and are returned
/// whole.
pub fn split_template(component: &str) -> (&str, Option<&str>)
{
    match component.find('<') {
        Some(open) if open > 0 && component.ends_with('>') => {
            (component[..open].trim_end(), Some(&component[open + 1..component.len() - 1]))
        }
        _ => (component, None),
    }
}

/// Template arguments of the innermost scope component.
pub fn template_arguments(name: &str) -> Vec<String>
{
    split_scope(name)
        .last()
        .and_then(|component| split_template(component).1)
        .map(|args| split_arguments(args).into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Replace everything that cannot appear in an identifier with `_`.
pub fn identifier(raw: &str) -> String
{
    let mut out: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Unqualified, argument-free name of a native type (`ns::List<int>` -> `List`).
pub fn simple_name(native: &str) -> String
{
    let last = split_scope(native).last().copied().unwrap_or(native);
    identifier(split_template(last).0)
}

/// Generated class name for a native type, optionally inside `namespace`.
///
/// ```rust
/// use projgen_core::symbols::names::class_name;
///
/// assert_eq!(class_name("std::vector<int,std::allocator<int> >", ""), "std.vector<int,std.allocator<int>>");
/// assert_eq!(class_name("Foo", "Gen"), "Gen.Foo");
/// ```
pub fn class_name(native: &str, namespace: &str) -> String
{
    let body = split_scope(native)
        .into_iter()
        .map(convert_component)
        .collect::<Vec<_>>()
        .join(".");
    if namespace.is_empty() {
        body
    } else {
        format!("{namespace}.{body}")
    }
}

/// Public property name for a field of the class `class_simple_name`.
///
/// Members cannot share their enclosing class's name in the generated
/// language, so such fields get a trailing `_`.
pub fn property_name(field_name: &str, class_simple_name: &str) -> String
{
    let mut name = identifier(field_name);
    if name == class_simple_name {
        name.push('_');
    }
    name
}

fn convert_component(component: &str) -> String
{
    let (base, args) = split_template(component);
    let base = identifier(base);
    match args {
        None => base,
        Some(args) => {
            let converted: Vec<String> = split_arguments(args).into_iter().map(convert_argument).collect();
            format!("{base}<{}>", converted.join(","))
        }
    }
}

fn convert_argument(arg: &str) -> String
{
    let arg = arg.trim();
    if arg.parse::<i64>().is_ok() {
        return arg.to_string();
    }

    let stripped = arg.trim_end_matches(['*', '&', ' ']);
    let indirections = arg[stripped.len()..].chars().filter(|c| matches!(c, '*' | '&')).count();
    let unqualified = stripped
        .trim_start_matches("const ")
        .trim_start_matches("volatile ")
        .trim_end_matches(" const");

    let mut converted = class_name(unqualified, "");
    for _ in 0..indirections {
        converted.push_str("_ptr");
    }
    converted
}
