/// Prompt shapes offered for the AI search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptTemplate {
    #[default]
    ListOpportunities,
    SummarizeCall,
    CompareCalls,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptInputs {
    pub theme: String,
    pub region: String,
    pub min_days: u32,
    pub link: Option<String>,
}

impl PromptTemplate {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "list" | "listar" => Some(Self::ListOpportunities),
            "summary" | "resumo" => Some(Self::SummarizeCall),
            "compare" | "comparar" => Some(Self::CompareCalls),
            _ => None,
        }
    }

    /// Label sent with the search request so the service can tag saved results.
    pub fn mode_label(self) -> &'static str {
        match self {
            Self::ListOpportunities => "Templates: list opportunities",
            Self::SummarizeCall => "Templates: call summary",
            Self::CompareCalls => "Templates: compare calls",
        }
    }

    pub fn render(self, inputs: &PromptInputs) -> String {
        let link = inputs
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        match self {
            Self::ListOpportunities => format!(
                "List relevant funding opportunities (calls for proposals) for {theme}, \
                 focused on {region}, with a minimum deadline of {days} days. \
                 Also consider the context of the call at the following link, if applicable: {link}. \
                 Include official links and summarize the main requirements.",
                theme = inputs.theme,
                region = inputs.region,
                days = inputs.min_days,
                link = link.unwrap_or("[no link provided]"),
            ),
            Self::SummarizeCall => format!(
                "Summarize the call for proposals available at the following link: {link}. \
                 Explain clearly: eligibility, deadlines, amounts, selection criteria and required documents. \
                 Organize the answer in bullet points and repeat the link at the end.",
                link = link.unwrap_or("[paste the call link here]"),
            ),
            Self::CompareCalls => format!(
                "Compare the call at the following main link: {link} \
                 with similar calls you find for {theme} in {region}. \
                 Highlight differences in focus, eligibility, deadlines and amounts. \
                 Produce a comparison table and bullets with the main conclusions.",
                link = link.unwrap_or("[paste the call link here]"),
                theme = inputs.theme,
                region = inputs.region,
            ),
        }
    }
}
