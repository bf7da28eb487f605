mod completion;
mod document_symbols;
mod folding_ranges;
mod goto;
mod hover;
