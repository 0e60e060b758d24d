use crate::domain::ports::{DraftRequest, Drafter};
use crate::utils::error::Result;
use async_trait::async_trait;
use regex::RegexBuilder;

pub const SKILL_KEYWORDS: &[&str] = &[
    "Python",
    "Machine Learning",
    "Data Analysis",
    "AI",
    "Deep Learning",
    "SQL",
    "Java",
    "Cloud Computing",
];

/// 在職缺描述中找出已知技能關鍵字 (不分大小寫、整個單字比對)，依清單順序回傳
pub fn extract_skills(description: &str) -> Vec<String> {
    SKILL_KEYWORDS
        .iter()
        .filter(|skill| {
            let pattern = format!(r"\b{}\b", regex::escape(skill).replace(' ', r"\s+"));
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(description))
                .unwrap_or(false)
        })
        .map(|skill| skill.to_string())
        .collect()
}

/// 不需要外部服務的範本求職信
#[derive(Debug, Clone, Default)]
pub struct TemplateDrafter;

impl TemplateDrafter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, request: &DraftRequest) -> String {
        let skills = extract_skills(&request.description);
        let background = if skills.is_empty() {
            "the areas this role calls for".to_string()
        } else {
            join_natural(&skills)
        };

        let mut signature = request
            .resume_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(2);
        let name = signature.next().unwrap_or_default();
        let contact = signature.next().unwrap_or_default();

        format!(
            "{date}\n\n\
             Dear Hiring Manager,\n\n\
             I am excited to apply for the {title} position at {company}. \
             With a strong background in {background}, I am eager to contribute my expertise to your team.\n\n\
             I look forward to the opportunity to discuss how my experience can support the continued success of {company}. \
             Thank you for your consideration.\n\n\
             Sincerely,\n\
             {name}\n\
             {contact}\n",
            date = chrono::Local::now().format("%d %B %Y"),
            title = request.job_title,
            company = request.company,
            background = background,
            name = name,
            contact = contact,
        )
        .trim_end()
        .to_string()
    }
}

#[async_trait]
impl Drafter for TemplateDrafter {
    async fn draft(&self, request: &DraftRequest) -> Result<String> {
        Ok(self.render(request))
    }
}

fn join_natural(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}
