use crate::api::{Channel, GtmApi, OutreachRequest, OutreachResult};
use crate::error::Result;

/// Text inputs of the prospect form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    CompanyName,
    Industry,
    CompanySize,
    PainPoints,
    DecisionMakerName,
    DecisionMakerTitle,
    RecentActivity,
}

impl FormField {
    pub fn all() -> [FormField; 7] {
        [
            FormField::CompanyName,
            FormField::Industry,
            FormField::CompanySize,
            FormField::PainPoints,
            FormField::DecisionMakerName,
            FormField::DecisionMakerTitle,
            FormField::RecentActivity,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::CompanyName => "Company Name",
            FormField::Industry => "Industry",
            FormField::CompanySize => "Company Size",
            FormField::PainPoints => "Pain Points (comma-separated)",
            FormField::DecisionMakerName => "Decision Maker Name",
            FormField::DecisionMakerTitle => "Title",
            FormField::RecentActivity => "Recent Activity",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            FormField::CompanyName => "Acme Corp",
            FormField::Industry => "SaaS",
            FormField::CompanySize => "50-200",
            FormField::PainPoints => "manual processes, poor pipeline visibility, low conversion rates",
            FormField::DecisionMakerName => "Jane Smith",
            FormField::DecisionMakerTitle => "VP Sales",
            FormField::RecentActivity => "Visited pricing page 3x, downloaded case study...",
        }
    }

    pub fn required(&self) -> bool {
        matches!(
            self,
            FormField::CompanyName
                | FormField::Industry
                | FormField::CompanySize
                | FormField::PainPoints
        )
    }
}

/// Raw prospect form as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutreachForm {
    pub company_name: String,
    pub industry: String,
    pub company_size: String,
    pub pain_points: String,
    pub decision_maker_name: String,
    pub decision_maker_title: String,
    pub recent_activity: String,
    pub channel: Channel,
}

impl OutreachForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::CompanyName => &self.company_name,
            FormField::Industry => &self.industry,
            FormField::CompanySize => &self.company_size,
            FormField::PainPoints => &self.pain_points,
            FormField::DecisionMakerName => &self.decision_maker_name,
            FormField::DecisionMakerTitle => &self.decision_maker_title,
            FormField::RecentActivity => &self.recent_activity,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::CompanyName => &mut self.company_name,
            FormField::Industry => &mut self.industry,
            FormField::CompanySize => &mut self.company_size,
            FormField::PainPoints => &mut self.pain_points,
            FormField::DecisionMakerName => &mut self.decision_maker_name,
            FormField::DecisionMakerTitle => &mut self.decision_maker_title,
            FormField::RecentActivity => &mut self.recent_activity,
        }
    }

    /// Generate is enabled only when every required field is filled in
    pub fn is_valid(&self) -> bool {
        FormField::all()
            .iter()
            .filter(|field| field.required())
            .all(|field| !self.field(*field).is_empty())
    }

    pub fn missing_fields(&self) -> Vec<FormField> {
        FormField::all()
            .into_iter()
            .filter(|field| field.required() && self.field(*field).is_empty())
            .collect()
    }

    pub fn pain_points(&self) -> Vec<String> {
        self.pain_points
            .split(',')
            .map(str::trim)
            .filter(|point| !point.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn to_request(&self) -> OutreachRequest {
        OutreachRequest {
            company_name: self.company_name.clone(),
            industry: self.industry.clone(),
            company_size: self.company_size.clone(),
            pain_points: self.pain_points(),
            decision_maker_name: optional(&self.decision_maker_name),
            decision_maker_title: optional(&self.decision_maker_title),
            recent_activity: optional(&self.recent_activity),
            channel: self.channel,
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// OutreachAI state: the form and the single most recent result
#[derive(Debug, Default)]
pub struct OutreachSession {
    pub form: OutreachForm,
    pub result: Option<OutreachResult>,
    pub loading: bool,
}

impl OutreachSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_generate(&self) -> bool {
        self.form.is_valid() && !self.loading
    }

    /// `None` when the form is incomplete or a generation is running.
    pub fn begin_generate(&mut self) -> Option<OutreachRequest> {
        if !self.can_generate() {
            return None;
        }
        self.loading = true;
        Some(self.form.to_request())
    }

    /// Replace the result on success; on failure log and keep the old one.
    pub fn finish_generate(&mut self, result: Result<OutreachResult>) {
        self.loading = false;
        match result {
            Ok(result) => self.result = Some(result),
            Err(e) => tracing::error!("Error generating outreach: {}", e),
        }
    }

    /// Returns whether a request was issued.
    pub async fn generate(&mut self, api: &dyn GtmApi) -> bool {
        let Some(request) = self.begin_generate() else {
            return false;
        };
        let result = api.generate(&request).await;
        self.finish_generate(result);
        true
    }

    pub fn copy_text(&self) -> Option<String> {
        self.result.as_ref().map(OutreachResult::copy_text)
    }
}
