//! HTML rewriting: partitions raw text inside HTML-content templates
//! into tag, attribute and text structural nodes.
//!
//! This must run before any pass that depends on HTML structure. The
//! scanner is permissive: anything that does not parse as a tag stays
//! raw text.

use crate::ast::{
    intern, FileSetNode, HtmlAttributeData, HtmlTagData, NodeId, NodeKind, RawTextData,
};
use crate::ast::{ContentKind, SourceSpan};
use crate::passes::{CompilerFilePass, PassCx};

pub struct HtmlRewritePass;

impl CompilerFilePass for HtmlRewritePass {
    fn name(&self) -> &'static str {
        "HtmlRewrite"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        for template in tree.templates_of(file) {
            if tree.template_data(template).content_kind != ContentKind::Html {
                continue;
            }
            for id in tree.walk(template) {
                if !tree.contains(id) {
                    continue;
                }
                if !tree.kind(id).is_raw_text() {
                    continue;
                }
                rewrite_raw_text(tree, id, cx);
            }
        }
    }
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[derive(Debug)]
struct AttrPiece {
    name: String,
    value: Option<String>,
    offset: usize,
}

#[derive(Debug)]
enum Piece {
    Text {
        text: String,
        offset: usize,
    },
    OpenTag {
        tag: String,
        attrs: Vec<AttrPiece>,
        self_closing: bool,
        offset: usize,
        len: usize,
    },
    CloseTag {
        tag: String,
        offset: usize,
        len: usize,
    },
}

fn rewrite_raw_text(tree: &mut FileSetNode, id: NodeId, cx: &mut PassCx<'_>) {
    let text = match tree.kind(id) {
        NodeKind::RawText(data) => data.text.clone(),
        _ => return,
    };
    let pieces = scan(&text);

    // Pure text parses to itself; leave the node alone.
    if pieces.len() == 1 && matches!(pieces[0], Piece::Text { .. }) {
        return;
    }
    if pieces.is_empty() {
        return;
    }

    let parent = match tree.parent(id) {
        Some(p) => p,
        None => return,
    };
    let base = tree.span(id);
    let sub_span = |offset: usize, len: usize| -> SourceSpan {
        SourceSpan::new_with_length(
            base.source_id(),
            base.start().offset() + offset as u32,
            len as u32,
        )
    };

    let mut replacement = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Text { text, offset } => {
                let span = sub_span(offset, text.len());
                replacement.push(tree.new_node(NodeKind::RawText(RawTextData { text }), span, cx.id_gen));
            }
            Piece::OpenTag {
                tag,
                attrs,
                self_closing,
                offset,
                len,
            } => {
                let span = sub_span(offset, len);
                let open = tree.new_node(
                    NodeKind::HtmlOpenTag(HtmlTagData {
                        tag: intern(&tag),
                        self_closing,
                    }),
                    span,
                    cx.id_gen,
                );
                for attr in attrs {
                    let attr_span = sub_span(attr.offset, attr.name.len());
                    let attr_node = tree.new_node(
                        NodeKind::HtmlAttribute(HtmlAttributeData {
                            name: intern(&attr.name),
                        }),
                        attr_span,
                        cx.id_gen,
                    );
                    tree.append_child(open, attr_node);
                    if let Some(value) = attr.value {
                        let value_node = tree.new_node(NodeKind::HtmlAttributeValue, attr_span, cx.id_gen);
                        tree.append_child(attr_node, value_node);
                        let text_node = tree.new_node(
                            NodeKind::RawText(RawTextData { text: value }),
                            attr_span,
                            cx.id_gen,
                        );
                        tree.append_child(value_node, text_node);
                    }
                }
                replacement.push(open);
            }
            Piece::CloseTag { tag, offset, len } => {
                let span = sub_span(offset, len);
                replacement.push(tree.new_node(
                    NodeKind::HtmlCloseTag(HtmlTagData {
                        tag: intern(&tag),
                        self_closing: false,
                    }),
                    span,
                    cx.id_gen,
                ));
            }
        }
    }

    let index = tree
        .child_index(parent, id)
        .expect("ICE: node is not a child of its parent");
    tree.insert_children(parent, index, &replacement);
    tree.release_subtree(id);
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn scan(text: &str) -> Vec<Piece> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut i = 0;
    let mut text_start = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some((piece, end)) = parse_tag(text, i) {
                if text_start < i {
                    pieces.push(Piece::Text {
                        text: text[text_start..i].to_string(),
                        offset: text_start,
                    });
                }
                pieces.push(piece);
                i = end;
                text_start = i;
                continue;
            }
        }
        i += 1;
    }
    if text_start < bytes.len() {
        pieces.push(Piece::Text {
            text: text[text_start..].to_string(),
            offset: text_start,
        });
    }
    pieces
}

fn parse_tag(text: &str, start: usize) -> Option<(Piece, usize)> {
    let bytes = text.as_bytes();
    let mut i = start + 1;

    let is_close = if i < bytes.len() && bytes[i] == b'/' {
        i += 1;
        true
    } else {
        false
    };

    let name_start = i;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let tag = text[name_start..i].to_ascii_lowercase();

    if is_close {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'>' {
            return Some((
                Piece::CloseTag {
                    tag,
                    offset: start,
                    len: i + 1 - start,
                },
                i + 1,
            ));
        }
        return None;
    }

    let mut attrs = Vec::new();
    let mut self_closing = is_void_tag(&tag);
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        if bytes[i] == b'>' {
            i += 1;
            break;
        }
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'>' {
            self_closing = true;
            i += 2;
            break;
        }

        let attr_start = i;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        if i == attr_start {
            // Junk inside the tag; give up and treat it as text.
            return None;
        }
        let name = text[attr_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = None;
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            if bytes[i] == b'"' || bytes[i] == b'\'' {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                if i >= bytes.len() {
                    return None;
                }
                value = Some(text[value_start..i].to_string());
                i += 1;
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = Some(text[value_start..i].to_string());
            }
        }
        attrs.push(AttrPiece {
            name,
            value,
            offset: attr_start,
        });
    }

    Some((
        Piece::OpenTag {
            tag,
            attrs,
            self_closing,
            offset: start,
            len: i - start,
        },
        i,
    ))
}
