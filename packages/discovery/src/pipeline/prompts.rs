//! LLM prompts for the discovery pipeline.
//!
//! Every prompt opens with an upper-case header line naming its purpose, so
//! logs (and test doubles) can tell them apart at a glance.

use crate::types::discovery::{SearchResult, StrategyId};

/// Prompt turning a strategy's search results into competitor names.
pub const EXTRACT_COMPETITORS_PROMPT: &str = r#"COMPETITOR EXTRACTION
Target company: {entity}
Industry: {industry}
Search angle: {angle}

Below are web search results. List the companies that are genuine competitors of {entity}: organizations selling similar products or services to the same customers in the same market.

Rules:
- Only real company or product names
- Do NOT include {entity} itself
- Do NOT include generic terms ("software vendors", "startups"), publishers, review sites, directories or analyst firms
- Use each company's common name, without legal suffixes

Respond with a JSON array of names only, for example ["Company A", "Company B"]. Respond with [] if there are none.

Search results:
{results}"#;

/// Prompt asking for a 0-100 competitor likelihood.
pub const SCORE_CANDIDATE_PROMPT: &str = r#"COMPETITOR SCORING
Target company: {entity}
Industry: {industry}
Candidate: {candidate}

On a scale of 0 to 100, how likely is it that the candidate is a genuine direct competitor of the target company, selling comparable products or services to the same customers?

Respond with the number only."#;

/// Prompt estimating how often an entity is cited online.
pub const CITATION_COUNT_PROMPT: &str = r#"CITATION COUNT
Company: {entity}

Estimate how many times this company is cited or mentioned across news articles, industry publications, review sites and forums over the last 12 months.

Respond with JSON only: {"citationCount": <number>}"#;

/// Prompt estimating an entity's average customer rating.
pub const CUSTOMER_RATING_PROMPT: &str = r#"CUSTOMER RATING
Company: {entity}

Estimate this company's average customer rating on public review platforms on a 1.0 to 5.0 scale.

Respond with JSON only: {"rating": <number>}"#;

/// Prompt estimating share of voice across a peer set.
pub const SHARE_OF_VOICE_PROMPT: &str = r#"SHARE OF VOICE
Companies: {entities}

Estimate the share of voice of each of these companies: the percentage of market-related media coverage and online mentions each one receives within this peer group. Percentages should sum to about 100.

Respond with JSON only:
{"shares": [{"company": "<name exactly as listed>", "percent": <number>}]}"#;

const UNSPECIFIED_INDUSTRY: &str = "unspecified";

/// Format the extraction prompt for one strategy's search results.
pub fn format_extract_prompt(
    entity: &str,
    industry: Option<&str>,
    strategy: StrategyId,
    results: &[SearchResult],
) -> String {
    let results_text = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {}\n{}\n{}", i + 1, r.title, r.link, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n");

    EXTRACT_COMPETITORS_PROMPT
        .replace("{industry}", industry.unwrap_or(UNSPECIFIED_INDUSTRY))
        .replace("{angle}", strategy.label())
        .replace("{results}", &results_text)
        .replace("{entity}", entity)
}

/// Format the scoring prompt for one candidate.
pub fn format_score_prompt(entity: &str, candidate: &str, industry: Option<&str>) -> String {
    SCORE_CANDIDATE_PROMPT
        .replace("{industry}", industry.unwrap_or(UNSPECIFIED_INDUSTRY))
        .replace("{candidate}", candidate)
        .replace("{entity}", entity)
}

/// Format the citation count prompt.
pub fn format_citation_prompt(entity: &str) -> String {
    CITATION_COUNT_PROMPT.replace("{entity}", entity)
}

/// Format the customer rating prompt.
pub fn format_rating_prompt(entity: &str) -> String {
    CUSTOMER_RATING_PROMPT.replace("{entity}", entity)
}

/// Format the share-of-voice prompt for the whole entity list.
pub fn format_share_of_voice_prompt(entities: &[String]) -> String {
    SHARE_OF_VOICE_PROMPT.replace("{entities}", &entities.join(", "))
}
