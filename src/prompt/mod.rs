use serde_json::{json, Value};

use crate::wire::{FullProductData, ProductData};

pub fn system_prompt_platform() -> String {
    "You are a senior product manager and software architect. Your task is to recommend the ideal platform for a new product. Respond in JSON format.".to_string()
}

pub fn user_prompt_platform(data: &ProductData) -> String {
    format!(
"Product Name: {name}
Description: {description}
Target Audience: {audience}
Problem it Solves: {problem}
Core Features:
{features}

Based on these details, recommend the best platform (e.g., Web App, Mobile App, Desktop App, Browser Extension) and provide a justification.",
        name = data.project_name,
        description = data.description,
        audience = data.target_audience,
        problem = data.problem_to_solve,
        features = data.features,
    )
}

pub fn system_prompt_prd() -> String {
    "You are an expert product manager. Create a detailed and well-structured PRD in Markdown format. The sections should include Introduction, Product Goals, Target Audience, User Stories/Features, Functional Requirements, and Non-Functional Requirements.".to_string()
}

pub fn user_prompt_prd(data: &FullProductData) -> String {
    let p = &data.product;
    let stories = p
        .features
        .split('\n')
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
"Product Name: {name}
Platform: {platform}
Description: {description}
Target Audience: {audience}
Problem it Solves: {problem}
Core Features / User Stories:
{stories}

Generate a comprehensive Product Requirements Document (PRD) based on these details.
Format the output as a single block of well-structured Markdown. Use headings (#, ##, ###), lists (*), and bold text (**) to create a clean, readable document.",
        name = p.project_name,
        platform = data.platform,
        description = p.description,
        audience = p.target_audience,
        problem = p.problem_to_solve,
        stories = stories,
    )
}

pub fn system_prompt_tickets() -> String {
    "You are a senior scrum master. Create a list of tickets for a system like Jira. For each ticket, provide a title, a short description, and a list of acceptance criteria in 'Given-When-Then' format. Respond in JSON format.".to_string()
}

pub fn user_prompt_tickets(data: &FullProductData) -> String {
    format!(
"Product Name: {name}
Platform: {platform}
Core Features / User Stories:
{features}

Generate development tickets for these features.",
        name = data.product.project_name,
        platform = data.platform,
        features = data.product.features,
    )
}

pub fn system_prompt_ai_prompts() -> String {
    r#"You are an expert AI prompt engineer specializing in creating instructions for large language models to generate code. For each feature listed, create a detailed and clear prompt that can be given directly to another AI code generator. Each prompt must be a complete instruction set for building a single React component. The prompt should: 1. Start with a clear persona for the AI (e.g., "You are an expert frontend developer specializing in React with TypeScript and Tailwind CSS."). 2. Specify the exact filename for the component (e.g., 'UserProfile.tsx'). 3. Detail the component's purpose and functionality. 4. List all necessary props, including their types. 5. Describe the required state variables and their purpose. 6. Provide a step-by-step implementation guide, including HTML structure (using semantic elements), Tailwind CSS classes for styling, and any logic for event handlers or data manipulation. 7. The final output from the AI should be a single, complete code block for the specified file. The prompt itself should be a clear, direct instruction, not a code comment. Respond in JSON format."#.to_string()
}

pub fn user_prompt_ai_prompts(data: &FullProductData) -> String {
    format!(
"Product Name: {name}
Platform: {platform}
Core Features / User Stories:
{features}

Create AI code generation prompts for these features. The target stack is React, TypeScript, and Tailwind CSS.",
        name = data.product.project_name,
        platform = data.platform,
        features = data.product.features,
    )
}

/// ========================================
/// Response schemas (Gemini `responseSchema` dialect)
/// ========================================

pub fn platform_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "platform": {
                "type": "STRING",
                "description": "The recommended platform (e.g., 'Web Application', 'Cross-Platform Mobile App')."
            },
            "justification": {
                "type": "STRING",
                "description": "A detailed explanation for why this platform is the best choice."
            }
        },
        "required": ["platform", "justification"]
    })
}

pub fn tickets_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "description": { "type": "STRING" },
                "acceptanceCriteria": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["title", "description", "acceptanceCriteria"]
        }
    })
}

pub fn ai_prompts_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "ticketTitle": { "type": "STRING" },
                "generationPrompt": { "type": "STRING" }
            },
            "required": ["ticketTitle", "generationPrompt"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> FullProductData {
        FullProductData {
            product: ProductData {
                project_name: "Cosmic Canvas".into(),
                description: "AI art".into(),
                target_audience: "artists".into(),
                problem_to_solve: "creative block".into(),
                features: "As a user, I can log in.\nAs a user, I can log out.".into(),
            },
            platform: "Web Application".into(),
        }
    }

    #[test]
    fn prd_prompt_bullets_every_feature_line() {
        let p = user_prompt_prd(&full());
        assert!(p.contains("Platform: Web Application"));
        assert!(p.contains("- As a user, I can log in.\n- As a user, I can log out."));
    }

    #[test]
    fn tickets_prompt_keeps_features_verbatim() {
        let p = user_prompt_tickets(&full());
        assert!(p.contains("As a user, I can log in.\nAs a user, I can log out."));
        assert!(!p.contains("- As a user"));
    }

    #[test]
    fn platform_prompt_lists_every_field() {
        let p = user_prompt_platform(&full().product);
        for needle in ["Cosmic Canvas", "AI art", "artists", "creative block", "I can log out."] {
            assert!(p.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn schemas_require_wire_field_names() {
        assert_eq!(platform_schema()["required"], json!(["platform", "justification"]));
        assert_eq!(tickets_schema()["items"]["required"][2], "acceptanceCriteria");
        assert_eq!(ai_prompts_schema()["items"]["required"][0], "ticketTitle");
    }
}
