#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Builds a [`Rule`](crate::Rule), boxing the closures and defaulting the
/// optional hooks.
///
/// ```ignore
/// rule! {
///     name: format!("{in_key} -> (+{suffix}) -> {out_key}"),
///     level: 0,
///     metadata: info,
///     propose: move |step| { ... },
///     verify: move |gen| { ... },
///     annotate: move |gen| { ... },          // optional
///     predecessors: move |rule| { ... },     // optional
///     expects_predecessors: true,            // optional, with predecessors
/// }
/// ```
#[macro_export]
macro_rules! rule {
    (@opt) => { None };
    (@opt $hook:expr) => { Some(Box::new($hook) as _) };
    (
        name: $name:expr,
        level: $level:expr,
        metadata: $meta:expr,
        propose: $propose:expr,
        verify: $verify:expr
        $(, annotate: $annotate:expr)?
        $(, predecessors: $pred:expr $(, expects_predecessors: $expects:expr)?)?
        $(,)?
    ) => {{
        $crate::Rule {
            name: ::std::string::String::from($name),
            level: $level,
            metadata: $meta,
            propose: Box::new($propose),
            verify: Box::new($verify),
            annotate: $crate::rule!(@opt $($annotate)?),
            predecessor_filter: $crate::rule!(@opt $($pred)?),
            expects_predecessors: { false $($(|| $expects)?)? },
        }
    }};
}
