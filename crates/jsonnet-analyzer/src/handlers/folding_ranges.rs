use crate::Analyzer;
use jsonnet_hir::DocumentManager;
use jsonnet_syntax::ast::NodeKind;
use lsp_types::{FoldingRange, FoldingRangeKind};
use url::Url;

impl<D: DocumentManager> Analyzer<D> {
    /// Foldable regions: multi-line objects, arrays and text blocks.
    #[must_use]
    pub fn folding_ranges(&self, url: &Url) -> Vec<FoldingRange> {
        let Some(doc) = self.snapshot(url) else {
            return Vec::new();
        };

        let mut ranges = Vec::new();
        for (_, data) in doc.ast.nodes() {
            let foldable = matches!(
                data.kind,
                NodeKind::Object { .. }
                    | NodeKind::ObjectComp { .. }
                    | NodeKind::Array { .. }
                    | NodeKind::ArrayComp { .. }
                    | NodeKind::LiteralString { .. }
            );
            if !foldable || data.loc.begin.line >= data.loc.end.line {
                continue;
            }
            ranges.push(FoldingRange {
                start_line: data.loc.begin.line as u32 - 1,
                start_character: None,
                end_line: data.loc.end.line as u32 - 1,
                end_character: None,
                kind: Some(FoldingRangeKind::Region),
            });
        }

        ranges.sort_by_key(|range| (range.start_line, range.end_line));
        ranges.dedup();
        ranges
    }
}
