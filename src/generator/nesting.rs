//! Upper estimate of how deep the element tree built from a document nests.
//!
//! html2md walks the tree recursively, one stack frame per level, so the depth
//! has to be known before a document is handed over. The scan runs over the
//! raw markup and stays on the high side of what the html5ever tree builder
//! produces: elements close only where the builder closes them, and unclosed
//! formatting elements, which the builder reopens, keep counting.

const VOID: &[&[u8]] = &[
    b"area", b"base", b"basefont", b"bgsound", b"br", b"col", b"embed", b"frame", b"hr",
    b"image", b"img", b"input", b"keygen", b"link", b"meta", b"param", b"source", b"track",
    b"wbr",
];

const RAW_TEXT: &[&[u8]] = &[
    b"iframe", b"noembed", b"noframes", b"noscript", b"plaintext", b"script", b"style",
    b"textarea", b"title", b"xmp",
];

const FORMATTING: &[&[u8]] = &[
    b"a", b"b", b"big", b"code", b"em", b"font", b"i", b"nobr", b"s", b"small", b"strike",
    b"strong", b"tt", b"u",
];

// opening one of these starts a new scope of formatting elements
const MARKERS: &[&[u8]] = &[
    b"applet", b"caption", b"marquee", b"object", b"td", b"template", b"th",
];

const SPECIAL: &[&[u8]] = &[
    b"address", b"applet", b"area", b"article", b"aside", b"base", b"basefont", b"bgsound",
    b"blockquote", b"body", b"br", b"button", b"caption", b"center", b"col", b"colgroup",
    b"dd", b"details", b"dir", b"div", b"dl", b"dt", b"embed", b"fieldset", b"figcaption",
    b"figure", b"footer", b"form", b"frame", b"frameset", b"h1", b"h2", b"h3", b"h4", b"h5",
    b"h6", b"head", b"header", b"hgroup", b"hr", b"html", b"iframe", b"img", b"input",
    b"keygen", b"li", b"link", b"listing", b"main", b"marquee", b"menu", b"meta", b"nav",
    b"noembed", b"noframes", b"noscript", b"object", b"ol", b"p", b"param", b"plaintext",
    b"pre", b"script", b"search", b"section", b"select", b"source", b"style", b"summary",
    b"table", b"tbody", b"td", b"template", b"textarea", b"tfoot", b"th", b"thead", b"title",
    b"tr", b"track", b"ul", b"wbr", b"xmp",
];

const CLOSES_P: &[&[u8]] = &[
    b"address", b"article", b"aside", b"blockquote", b"center", b"dd", b"details", b"dialog",
    b"dir", b"div", b"dl", b"dt", b"fieldset", b"figcaption", b"figure", b"footer", b"h1",
    b"h2", b"h3", b"h4", b"h5", b"h6", b"header", b"hgroup", b"hr", b"li", b"listing",
    b"main", b"menu", b"nav", b"ol", b"p", b"plaintext", b"pre", b"search", b"section",
    b"summary", b"ul", b"xmp",
];

const HEADINGS: &[&[u8]] = &[b"h1", b"h2", b"h3", b"h4", b"h5", b"h6"];

// html elements that end svg and math content
const BREAKOUT: &[&[u8]] = &[
    b"b", b"big", b"blockquote", b"body", b"br", b"center", b"code", b"dd", b"div", b"dl",
    b"dt", b"em", b"embed", b"font", b"h1", b"h2", b"h3", b"h4", b"h5", b"h6", b"head", b"hr",
    b"i", b"img", b"li", b"listing", b"menu", b"meta", b"nobr", b"ol", b"p", b"pre", b"ruby",
    b"s", b"small", b"span", b"strike", b"strong", b"sub", b"sup", b"table", b"tt", b"u",
    b"ul", b"var",
];

const INTEGRATION_POINTS: &[&[u8]] = &[
    b"annotation-xml", b"desc", b"foreignobject", b"mi", b"mn", b"mo", b"ms", b"mtext",
    b"title",
];

const DEFAULT_SCOPE: &[&[u8]] = &[
    b"applet", b"caption", b"html", b"marquee", b"object", b"table", b"td", b"template", b"th",
];

const BUTTON_SCOPE: &[&[u8]] = &[
    b"applet", b"button", b"caption", b"html", b"marquee", b"object", b"table", b"td",
    b"template", b"th",
];

const LIST_SCOPE: &[&[u8]] = &[
    b"applet", b"caption", b"html", b"marquee", b"object", b"ol", b"table", b"td",
    b"template", b"th", b"ul",
];

const TABLE_SCOPE: &[&[u8]] = &[b"html", b"table", b"template"];

/// Deepest nesting reached while scanning `html`. Scanning stops as soon as
/// `limit` is exceeded, so any value above `limit` only means "too deep".
pub fn nesting_depth(html: &str, limit: usize) -> usize {
    let bytes = html.as_bytes();
    let mut tree = Tree::default();
    let mut deepest = 0;
    let mut i = 0;

    while deepest <= limit {
        let Some(offset) = bytes[i..].iter().position(|&b| b == b'<') else {
            break;
        };
        i += offset;
        let rest = &bytes[i..];

        if rest.starts_with(b"<!--") {
            i = find(bytes, i + 2, b"-->").map_or(bytes.len(), |end| end + 3);
            continue;
        }
        if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
            i = find(bytes, i, b">").map_or(bytes.len(), |end| end + 1);
            continue;
        }

        let is_end = rest.get(1) == Some(&b'/');
        let name_start = if is_end { i + 2 } else { i + 1 };
        if !bytes.get(name_start).is_some_and(u8::is_ascii_alphabetic) {
            i += 1;
            continue;
        }
        let name_end = bytes[name_start..]
            .iter()
            .position(|&b| !is_name_char(b))
            .map_or(bytes.len(), |p| name_start + p);

        // an unterminated tag swallows the rest of the document
        let Some((close, self_closing)) = find_tag_end(bytes, name_end) else {
            break;
        };
        let name = bytes[name_start..name_end].to_ascii_lowercase();
        i = close + 1;

        if is_end {
            tree.end(&name);
            continue;
        }

        let attrs = bytes[name_end..close].trim_ascii();
        if tree.start(&name, attrs, self_closing) {
            i = skip_raw_text(bytes, i, &name);
        }
        deepest = deepest.max(tree.depth());
    }

    deepest
}

struct Element {
    name: Vec<u8>,
    foreign: bool,
    marker: bool,
}

struct Formatting {
    name: Vec<u8>,
    attrs: Vec<u8>,
}

#[derive(Default)]
struct Tree {
    open: Vec<Element>,
    // None separates the scopes opened by marker elements
    active: Vec<Option<Formatting>>,
    formatting: usize,
}

impl Tree {
    fn depth(&self) -> usize {
        self.open.len() + self.formatting
    }

    /// Returns true when the element's content is raw text.
    fn start(&mut self, name: &[u8], attrs: &[u8], self_closing: bool) -> bool {
        if matches!(name, b"html" | b"head" | b"body") {
            return false;
        }

        let foreign = match self.open.last() {
            _ if name == b"svg" || name == b"math" => true,
            Some(parent) => {
                parent.foreign && !is(INTEGRATION_POINTS, &parent.name) && !is(BREAKOUT, name)
            }
            None => false,
        };
        if foreign {
            if !self_closing {
                self.push(name, true);
            }
            return false;
        }

        self.close_implied(name);
        if name == b"a" {
            self.end_formatting(b"a");
        }
        if is(VOID, name) {
            return false;
        }
        if is(RAW_TEXT, name) {
            return true;
        }

        self.push(name, false);
        if is(FORMATTING, name) {
            self.push_formatting(name, attrs);
        }
        false
    }

    fn end(&mut self, name: &[u8]) {
        if matches!(name, b"html" | b"head" | b"body") {
            return;
        }
        if is(FORMATTING, name) && self.end_formatting(name) {
            return;
        }

        match name {
            _ if is(HEADINGS, name) => self.close_in_scope(HEADINGS, DEFAULT_SCOPE),
            b"p" => self.close_in_scope(&[b"p"], BUTTON_SCOPE),
            b"li" => self.close_in_scope(&[b"li"], LIST_SCOPE),
            b"table" | b"tbody" | b"td" | b"tfoot" | b"th" | b"thead" | b"tr" => {
                self.close_in_scope(&[name], TABLE_SCOPE)
            }
            _ if is(SPECIAL, name) => self.close_in_scope(&[name], DEFAULT_SCOPE),
            _ => self.close_nearest(name),
        }
    }

    fn push(&mut self, name: &[u8], foreign: bool) {
        let marker = !foreign && is(MARKERS, name);
        if marker {
            self.active.push(None);
        }
        self.open.push(Element {
            name: name.to_vec(),
            foreign,
            marker,
        });
    }

    fn push_formatting(&mut self, name: &[u8], attrs: &[u8]) {
        // at most three identical entries per scope, the oldest goes first
        let scope = self.scope_start();
        let same: Vec<usize> = (scope..self.active.len())
            .filter(|&idx| {
                matches!(&self.active[idx], Some(f) if f.name == name && f.attrs == attrs)
            })
            .collect();
        if same.len() >= 3 {
            self.active.remove(same[0]);
            self.formatting -= 1;
        }

        self.active.push(Some(Formatting {
            name: name.to_vec(),
            attrs: attrs.to_vec(),
        }));
        self.formatting += 1;
    }

    fn end_formatting(&mut self, name: &[u8]) -> bool {
        let scope = self.scope_start();
        let Some(pos) = self.active[scope..]
            .iter()
            .rposition(|entry| matches!(entry, Some(f) if f.name == name))
        else {
            return false;
        };
        self.active.remove(scope + pos);
        self.formatting -= 1;

        // misnested elements are moved by the tree builder rather than closed
        if self.open.last().is_some_and(|e| e.name == name) {
            self.open.pop();
        }
        true
    }

    fn scope_start(&self) -> usize {
        self.active
            .iter()
            .rposition(Option::is_none)
            .map_or(0, |idx| idx + 1)
    }

    fn close_implied(&mut self, name: &[u8]) {
        match name {
            b"li" => self.close_list_item(&[b"li"]),
            b"dd" | b"dt" => self.close_list_item(&[b"dd", b"dt"]),
            b"td" | b"th" => self.close_in_scope(&[b"td", b"th"], TABLE_SCOPE),
            b"tr" => self.close_in_scope(&[b"tr"], TABLE_SCOPE),
            b"tbody" | b"tfoot" | b"thead" => {
                self.close_in_scope(&[b"tbody", b"tfoot", b"thead"], TABLE_SCOPE)
            }
            b"option" => {
                if self.open.last().is_some_and(|e| e.name == b"option") {
                    self.open.pop();
                }
            }
            _ => {}
        }

        if is(CLOSES_P, name) {
            self.close_in_scope(&[b"p"], BUTTON_SCOPE);
        }
        if is(HEADINGS, name) && self.open.last().is_some_and(|e| is(HEADINGS, &e.name)) {
            self.open.pop();
        }
    }

    fn close_in_scope(&mut self, names: &[&[u8]], scope: &[&[u8]]) {
        for idx in (0..self.open.len()).rev() {
            let element = self.open[idx].name.as_slice();
            if is(names, element) {
                self.truncate(idx);
                return;
            }
            if is(scope, element) {
                return;
            }
        }
    }

    fn close_list_item(&mut self, names: &[&[u8]]) {
        for idx in (0..self.open.len()).rev() {
            let element = self.open[idx].name.as_slice();
            if is(names, element) {
                self.truncate(idx);
                return;
            }
            if is(SPECIAL, element) && !matches!(element, b"address" | b"div" | b"p") {
                return;
            }
        }
    }

    fn close_nearest(&mut self, name: &[u8]) {
        for idx in (0..self.open.len()).rev() {
            let element = &self.open[idx];
            if element.name == name {
                self.truncate(idx);
                return;
            }
            if !element.foreign && is(SPECIAL, &element.name) {
                return;
            }
        }
    }

    fn truncate(&mut self, len: usize) {
        while self.open.len() > len {
            let Some(element) = self.open.pop() else {
                break;
            };
            if element.marker {
                self.clear_to_marker();
            }
        }
    }

    fn clear_to_marker(&mut self) {
        while let Some(entry) = self.active.pop() {
            match entry {
                None => break,
                Some(_) => self.formatting -= 1,
            }
        }
    }
}

fn is(set: &[&[u8]], name: &[u8]) -> bool {
    set.contains(&name)
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Position of the `>` closing the tag whose attributes start at `i`, and
/// whether the tag is self-closing. Quotes only count inside attribute values.
fn find_tag_end(s: &[u8], mut i: usize) -> Option<(usize, bool)> {
    // an attribute name is waiting for its value
    let mut named = false;
    let mut slash = false;

    while let Some(&b) = s.get(i) {
        match b {
            b'>' => return Some((i, slash)),
            b'/' => {
                named = false;
                slash = true;
                i += 1;
                continue;
            }
            b'=' if named => {
                named = false;
                i += 1;
                while s.get(i).is_some_and(u8::is_ascii_whitespace) {
                    i += 1;
                }
                match s.get(i) {
                    Some(&q @ (b'"' | b'\'')) => {
                        let len = s[i + 1..].iter().position(|&c| c == q)?;
                        i += len + 2;
                    }
                    _ => {
                        while s
                            .get(i)
                            .is_some_and(|&c| !c.is_ascii_whitespace() && c != b'>')
                        {
                            i += 1;
                        }
                    }
                }
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ => {
                named = true;
                i += 1;
            }
        }
        slash = false;
    }
    None
}

/// Index just past the end tag closing a raw text element opened before
/// `from`, or the end of input.
fn skip_raw_text(s: &[u8], mut from: usize, name: &[u8]) -> usize {
    while let Some(start) = find(s, from, b"</") {
        let name_end = start + 2 + name.len();
        let same_name = s
            .get(start + 2..name_end)
            .is_some_and(|n| n.eq_ignore_ascii_case(name));
        let terminated = matches!(
            s.get(name_end),
            Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>'
        );
        if same_name && terminated {
            return find_tag_end(s, name_end).map_or(s.len(), |(close, _)| close + 1);
        }
        from = start + 2;
    }
    s.len()
}
