//! Override synthesis.
//!
//! [`synthesize`] walks the loaded documents for every [`Target`] and builds a separate
//! [`OverrideDocument`] out of cloned blocks carrying an `https_proxy` attribute. Terraform
//! merges `*_override.tf` files after the regular ones, so the injected attribute wins without
//! touching the user's sources.

use hcl_edit::expr::Expression;
use hcl_edit::structure::{Attribute, Block, BlockLabel, Body, Structure};
use hcl_edit::{Decorate, Ident};

use crate::loader::ConfigurationDocument;
use crate::target::{Target, TargetKind};

/// File written next to the user's configuration.
pub const OVERRIDE_FILENAME: &str = "terraform_proxy_providers_override.tf";

/// Attribute injected into every matched block.
pub const PROXY_ATTRIBUTE: &str = "https_proxy";

/// Root settings block that can nest backend declarations.
pub const WRAPPER_BLOCK: &str = "terraform";

const ALIAS_ATTRIBUTE: &str = "alias";

const INDENT: &str = "  ";

/// One `(kind, name, proxy)` triple written to the override document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct InjectedProxy {
    pub kind: TargetKind,
    pub name: String,
    pub proxy: String,
}

/// Blocks synthesized during one run, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct OverrideDocument {
    body: Body,
    injected: Vec<InjectedProxy>,
}

impl OverrideDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block, injected: InjectedProxy) {
        self.body.push(block);
        self.injected.push(injected);
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn injected(&self) -> &[InjectedProxy] {
        &self.injected
    }

    /// Number of emitted blocks.
    pub fn len(&self) -> usize {
        self.injected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injected.is_empty()
    }

    /// HCL text of the document.
    pub fn to_hcl(&self) -> String {
        self.body.to_string()
    }
}

/// Where a target was found.
#[derive(Debug, Clone, Copy)]
pub enum BlockMatch<'a> {
    /// Top-level provider/backend block.
    Direct(&'a Block),
    /// Block nested in a `terraform` wrapper, by its position in the wrapper body.
    Nested { wrapper: &'a Block, index: usize },
}

fn label_str(label: &BlockLabel) -> &str {
    match label {
        BlockLabel::Ident(ident) => ident.as_str(),
        BlockLabel::String(s) => s.as_str(),
    }
}

fn is_target_block(block: &Block, target: &Target) -> bool {
    block.ident.as_str() == target.kind.as_str()
        && block
            .labels
            .first()
            .is_some_and(|label| label_str(label) == target.name)
}

fn string_value(expr: &Expression) -> Option<&str> {
    match expr {
        Expression::String(s) => Some(s.as_str().trim().trim_matches('"')),
        _ => None,
    }
}

fn alias_matches(block: &Block, alias: &str) -> bool {
    block
        .body
        .get_attribute(ALIAS_ATTRIBUTE)
        .and_then(|attr| string_value(&attr.value))
        .is_some_and(|value| value == alias)
}

fn blocks(body: &Body) -> impl Iterator<Item = (usize, &Block)> {
    body.iter()
        .enumerate()
        .filter_map(|(index, structure)| structure.as_block().map(|block| (index, block)))
}

/// Finds every block `target` points at, in document order.
pub fn find_matches<'a>(
    documents: &'a [ConfigurationDocument],
    target: &Target,
) -> Vec<BlockMatch<'a>> {
    let mut matches = Vec::new();

    for document in documents {
        for (_, block) in blocks(&document.body) {
            if is_target_block(block, target) {
                let accepted = match &target.alias {
                    Some(alias) => alias_matches(block, alias),
                    None => true,
                };
                if accepted {
                    matches.push(BlockMatch::Direct(block));
                }
            }

            if block.ident.as_str() == WRAPPER_BLOCK {
                for (index, nested) in blocks(&block.body) {
                    if is_target_block(nested, target) {
                        matches.push(BlockMatch::Nested {
                            wrapper: block,
                            index,
                        });
                    }
                }
            }
        }
    }

    matches
}

/// Line indent of the first attribute in `body`, when it sits on its own line.
fn sibling_indent(body: &Body) -> Option<String> {
    if body.prefer_oneline() {
        return None;
    }
    let attribute = body.iter().find_map(Structure::as_attribute)?;

    let mut single = Body::new();
    single.push(attribute.clone());
    let text = single.to_string();

    let lead = &text[..text.find(|c: char| !c.is_whitespace())?];
    let indent = lead.rsplit('\n').next().unwrap_or(lead);
    (!indent.is_empty()).then(|| indent.to_string())
}

/// Sets `https_proxy` on `body`, after a blank line, replacing any previous value.
///
/// The attribute lines up with the block's existing attributes; `depth` levels of [`INDENT`]
/// are used when there is nothing to line up with.
fn stamp_proxy(body: &mut Body, proxy: &str, depth: usize) {
    let indent = sibling_indent(body).unwrap_or_else(|| INDENT.repeat(depth));

    body.remove_attribute(PROXY_ATTRIBUTE);
    body.set_prefer_oneline(false);

    let mut attribute = Attribute::new(Ident::new(PROXY_ATTRIBUTE), proxy.to_string());
    attribute.decor_mut().set_prefix(format!("\n{indent}"));
    body.push(attribute);
}

fn build_block(found: BlockMatch<'_>, proxy: &str) -> Block {
    match found {
        BlockMatch::Direct(block) => {
            let mut block = block.clone();
            stamp_proxy(&mut block.body, proxy, 1);
            block
        }
        BlockMatch::Nested { wrapper, index } => {
            let mut body = Body::new();
            for (position, structure) in wrapper.body.iter().enumerate() {
                let mut structure = structure.clone();
                if position == index {
                    if let Structure::Block(nested) = &mut structure {
                        stamp_proxy(&mut nested.body, proxy, 2);
                    }
                }
                body.push(structure);
            }

            let mut block = wrapper.clone();
            block.body = body;
            block
        }
    }
}

/// Builds the override document for `targets`.
///
/// Source documents are only read. A target without any match contributes nothing.
pub fn synthesize<F>(
    documents: &[ConfigurationDocument],
    targets: &[Target],
    proxy_for: F,
) -> OverrideDocument
where
    F: Fn(&str) -> String,
{
    let mut document = OverrideDocument::new();

    for target in targets {
        let proxy = proxy_for(&target.name);
        let matches = find_matches(documents, target);

        if matches.is_empty() {
            tracing::debug!(provider = %target, "no matching block, skipping");
            continue;
        }

        for found in matches {
            document.push(
                build_block(found, &proxy),
                InjectedProxy {
                    kind: target.kind,
                    name: target.name.clone(),
                    proxy: proxy.clone(),
                },
            );
        }
        tracing::debug!(provider = %target, proxy = %proxy, "proxy injected");
    }

    document
}

fn injected_in(block: &Block) -> Option<InjectedProxy> {
    let kind = block.ident.as_str().parse::<TargetKind>().ok()?;
    let name = label_str(block.labels.first()?).to_string();
    let proxy = block
        .body
        .get_attribute(PROXY_ATTRIBUTE)
        .and_then(|attr| string_value(&attr.value))?
        .to_string();
    Some(InjectedProxy { kind, name, proxy })
}

/// Reads back the `(kind, name, proxy)` triples from an override body.
pub fn collect_injected(body: &Body) -> Vec<InjectedProxy> {
    let mut found = Vec::new();
    for (_, block) in blocks(body) {
        if block.ident.as_str() == WRAPPER_BLOCK {
            found.extend(blocks(&block.body).filter_map(|(_, nested)| injected_in(nested)));
        } else {
            found.extend(injected_in(block));
        }
    }
    found
}
