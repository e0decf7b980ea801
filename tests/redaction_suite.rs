// Redaction Pipeline Test Suite
//
// End-to-end coverage for the sanitization pipeline:
// - Literal document scenarios (contracts, bank letters, alias chains)
// - Quantified pipeline invariants (determinism, disjointness, safety)
// - Optional provider integration and failure handling

mod redaction;
