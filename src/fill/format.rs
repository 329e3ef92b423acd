//! Formatting pipeline.
//!
//! Turns an [`ArgumentPlan`] into the text that has to be written into
//! the argument list of a call site.  The stages run in a fixed order,
//! each one operating on a small render tree of the argument list:
//!
//! 1. insert: planned arguments go after all existing ones;
//! 2. line split: the outer list and every newly created nested list
//!    get one argument per line;
//! 3. trailing comma: added to the same lists unless one already exists;
//! 4. reference shortening: qualified references are written by their
//!    short name, collecting the imports this requires;
//! 5. cursor stops: ranges of the inserted values, in plan order.
//!
//! Stages 4 and 5 happen while the tree is rendered to text.  When the
//! whole interior is rewritten, comments found between the existing
//! arguments travel with them; only whitespace changes.

use std::ops::Range;

use crate::fill::import_edit::{ImportScope, Reference};
use crate::types::{
    ArgumentComments, ArgumentListSite, ArgumentPlan, FillPolicy, TypeRef, ValueExpr,
};

/// Continuation indent for arguments moved to their own line.
const CONTINUATION_INDENT: &str = "        ";

/// The formatted result for one argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentListEdit {
    /// Byte range of the document replaced by `new_text`.
    pub range: Range<usize>,
    pub new_text: String,
    /// Import paths the shortened references rely on, in insertion order.
    pub imports: Vec<String>,
    /// Ranges of the inserted values, relative to `new_text`.
    pub cursor_stops: Vec<Range<usize>>,
}

#[derive(Debug, Clone)]
struct ListNode {
    items: Vec<Item>,
    chopped: bool,
    trailing_comma: bool,
    /// Comments after the last existing item, or before the first item
    /// when nothing existed.
    dangling: Vec<String>,
}

#[derive(Debug, Clone)]
enum Item {
    Existing {
        text: String,
        comments: ArgumentComments,
    },
    Inserted { name: String, value: Option<Value> },
}

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Reference {
        type_ref: TypeRef,
        member: Option<String>,
    },
    Call {
        type_ref: TypeRef,
        list: ListNode,
    },
    Lambda(Vec<(String, TypeRef)>),
}

impl ListNode {
    fn from_plan(plan: &ArgumentPlan) -> Self {
        ListNode {
            items: plan
                .arguments
                .iter()
                .map(|arg| Item::Inserted {
                    name: arg.parameter_name.clone(),
                    value: arg.value.as_ref().map(Value::from_expr),
                })
                .collect(),
            chopped: false,
            trailing_comma: false,
            dangling: Vec::new(),
        }
    }

    /// Nested lists created by synthesis, outermost first.
    fn for_each_nested(&mut self, f: &mut impl FnMut(&mut ListNode)) {
        for item in &mut self.items {
            if let Item::Inserted {
                value: Some(Value::Call { list, .. }),
                ..
            } = item
            {
                f(list);
                list.for_each_nested(f);
            }
        }
    }
}

impl Value {
    fn from_expr(expr: &ValueExpr) -> Self {
        match expr {
            ValueExpr::Literal(text) => Value::Text(text.clone()),
            ValueExpr::Reference { type_ref, member } => Value::Reference {
                type_ref: type_ref.clone(),
                member: member.clone(),
            },
            ValueExpr::Construct {
                type_ref,
                arguments,
            } => Value::Call {
                type_ref: type_ref.clone(),
                list: ListNode::from_plan(arguments),
            },
            ValueExpr::Lambda { parameters } => Value::Lambda(parameters.clone()),
        }
    }
}

/// Run the pipeline for `plan` at `site`.
///
/// Cursor stops are only produced for interactive renders with
/// `place_cursor_at_each_argument` enabled.
pub fn format_arguments(
    site: &ArgumentListSite,
    plan: &ArgumentPlan,
    policy: &FillPolicy,
    scope: &ImportScope,
    interactive: bool,
) -> ArgumentListEdit {
    let mut list = insert(site, plan);
    if policy.one_argument_per_line {
        split_lines(&mut list);
    }
    if policy.append_trailing_comma {
        add_trailing_commas(&mut list);
    }
    if site.has_trailing_comma() {
        list.trailing_comma = true;
    }

    let mut renderer = Renderer::new(scope, &site.line_indent);
    let range = if list.chopped || site.arguments.is_empty() {
        renderer.list_interior(&list, true);
        site.open_paren + 1..site.close_paren
    } else {
        renderer.appended_items(&list, site.has_trailing_comma());
        let at = site
            .trailing_comma_end
            .or_else(|| site.arguments.last().map(|a| a.span.end))
            .unwrap_or(site.open_paren + 1);
        at..at
    };

    let mut cursor_stops = renderer.stops;
    if !(interactive && policy.place_cursor_at_each_argument) {
        cursor_stops.clear();
    }
    ArgumentListEdit {
        range,
        new_text: renderer.out,
        imports: renderer.imports,
        cursor_stops,
    }
}

fn insert(site: &ArgumentListSite, plan: &ArgumentPlan) -> ListNode {
    let mut list = ListNode::from_plan(plan);
    let mut items: Vec<Item> = site
        .arguments
        .iter()
        .map(|arg| Item::Existing {
            text: arg.text.clone(),
            comments: arg.comments.clone(),
        })
        .collect();
    items.append(&mut list.items);
    list.items = items;
    list.dangling = site.dangling_comments.clone();
    list
}

fn split_lines(list: &mut ListNode) {
    list.chopped = !list.items.is_empty();
    list.for_each_nested(&mut |nested: &mut ListNode| nested.chopped = !nested.items.is_empty());
}

fn add_trailing_commas(list: &mut ListNode) {
    list.trailing_comma = !list.items.is_empty();
    list.for_each_nested(&mut |nested: &mut ListNode| nested.trailing_comma = !nested.items.is_empty());
}

struct Renderer<'a> {
    scope: &'a ImportScope,
    base_indent: &'a str,
    out: String,
    imports: Vec<String>,
    stops: Vec<Range<usize>>,
}

impl<'a> Renderer<'a> {
    fn new(scope: &'a ImportScope, base_indent: &'a str) -> Self {
        Self {
            scope,
            base_indent,
            out: String::new(),
            imports: Vec::new(),
            stops: Vec::new(),
        }
    }

    /// Indentation of the line currently being written.
    fn line_indent(&self) -> String {
        match self.out.rfind('\n') {
            Some(pos) => self.out[pos + 1..]
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect(),
            None => self.base_indent.to_string(),
        }
    }

    /// Everything between `(` and `)`.
    fn list_interior(&mut self, list: &ListNode, record_stops: bool) {
        let open_line_indent = self.line_indent();
        let item_indent = format!("{}{}", open_line_indent, CONTINUATION_INDENT);
        let last_existing = list
            .items
            .iter()
            .rposition(|item| matches!(item, Item::Existing { .. }));
        // After a `//` comment the next output has to start a new line.
        let mut line_ended = false;

        if last_existing.is_none() {
            for comment in &list.dangling {
                self.out.push_str(comment);
                self.gap(list.chopped || is_line_comment(comment), &item_indent);
            }
        }
        for (i, item) in list.items.iter().enumerate() {
            if i > 0 {
                self.gap(list.chopped || line_ended, &item_indent);
                line_ended = false;
            }
            let comma = i + 1 < list.items.len() || list.trailing_comma;
            match item {
                Item::Existing { text, comments } => {
                    for comment in &comments.leading {
                        self.out.push_str(comment);
                        self.gap(list.chopped || is_line_comment(comment), &item_indent);
                    }
                    self.out.push_str(text);
                    for comment in &comments.inline {
                        self.out.push(' ');
                        self.out.push_str(comment);
                        line_ended = is_line_comment(comment);
                    }
                    if comma {
                        if line_ended {
                            self.gap(true, &item_indent);
                            line_ended = false;
                        }
                        self.out.push(',');
                    }
                    for comment in &comments.trailing {
                        self.out.push(' ');
                        self.out.push_str(comment);
                        line_ended = is_line_comment(comment);
                    }
                }
                Item::Inserted { .. } => {
                    self.item(item, record_stops);
                    if comma {
                        self.out.push(',');
                    }
                }
            }
            if Some(i) == last_existing {
                for comment in &list.dangling {
                    self.gap(list.chopped || line_ended, &item_indent);
                    self.out.push_str(comment);
                    line_ended = is_line_comment(comment);
                }
            }
        }
        if (list.chopped && list.trailing_comma) || line_ended {
            self.out.push('\n');
            self.out.push_str(&open_line_indent);
        }
    }

    /// Only the inserted items, written after the existing arguments.
    fn appended_items(&mut self, list: &ListNode, after_comma: bool) {
        let mut first = true;
        for item in &list.items {
            if matches!(item, Item::Existing { .. }) {
                continue;
            }
            if first && after_comma {
                self.out.push(' ');
            } else {
                self.out.push_str(", ");
            }
            first = false;
            self.item(item, true);
        }
        if list.trailing_comma {
            self.out.push(',');
        }
    }

    /// Whitespace between two pieces of a list.
    fn gap(&mut self, new_line: bool, item_indent: &str) {
        if new_line {
            self.out.push('\n');
            self.out.push_str(item_indent);
        } else {
            self.out.push(' ');
        }
    }

    fn item(&mut self, item: &Item, record_stop: bool) {
        match item {
            Item::Existing { text, .. } => self.out.push_str(text),
            Item::Inserted { name, value } => {
                self.out.push_str(name);
                self.out.push_str(" =");
                match value {
                    Some(value) => {
                        self.out.push(' ');
                        let start = self.out.len();
                        self.value(value);
                        if record_stop {
                            self.stops.push(start..self.out.len());
                        }
                    }
                    None if record_stop => {
                        let at = self.out.len();
                        self.stops.push(at..at);
                    }
                    None => {}
                }
            }
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Text(text) => self.out.push_str(text),
            Value::Reference { type_ref, member } => {
                let text = self.type_name(type_ref);
                self.out.push_str(&text);
                if let Some(member) = member {
                    self.out.push('.');
                    self.out.push_str(member);
                }
            }
            Value::Call { type_ref, list } => {
                let text = self.type_name(type_ref);
                self.out.push_str(&text);
                self.out.push('(');
                self.list_interior(list, false);
                self.out.push(')');
            }
            Value::Lambda(parameters) if parameters.is_empty() => self.out.push_str("{}"),
            Value::Lambda(parameters) => {
                self.out.push_str("{ ");
                for (i, (name, type_ref)) in parameters.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    let text = self.type_name(type_ref);
                    self.out.push_str(name);
                    self.out.push_str(": ");
                    self.out.push_str(&text);
                    if type_ref.nullable {
                        self.out.push('?');
                    }
                }
                self.out.push_str(" -> }");
            }
        }
    }

    /// Short name when visible (importing it if needed), else qualified.
    fn type_name(&mut self, type_ref: &TypeRef) -> String {
        match self.scope.reference_for(type_ref, &self.imports) {
            Reference::Short => type_ref.name.clone(),
            Reference::Import(path) => {
                self.imports.push(path);
                type_ref.name.clone()
            }
            Reference::Qualified => type_ref.qualified_name(),
        }
    }
}

fn is_line_comment(comment: &str) -> bool {
    comment.starts_with("//")
}
