use crate::models::{DeploymentType, ExclusionRule, MappingRule, PatternType};

fn exclusion(id: u64, pattern_type: PatternType, value: &str, category: &str, reason: &str) -> ExclusionRule {
    ExclusionRule {
        id,
        pattern_type,
        pattern_value: value.to_string(),
        category: category.to_string(),
        reason: reason.to_string(),
        active: true,
    }
}

fn mapping(
    id: u64,
    pattern_type: PatternType,
    pattern: &str,
    canonical: &str,
    category: &str,
    deployment: DeploymentType,
    description: &str,
) -> MappingRule {
    MappingRule {
        id,
        pattern_type,
        original_pattern: pattern.to_string(),
        canonical_name: canonical.to_string(),
        category: category.to_string(),
        deployment_type: Some(deployment),
        description: description.to_string(),
        active: true,
    }
}

/// Built-in noise filters: OS patches, drivers, runtimes and language packs.
pub fn default_exclusion_rules() -> Vec<ExclusionRule> {
    use PatternType::*;

    vec![
        exclusion(1, StartsWith, "Security Update for", "Windows Updates", "Operating system or Office security patch"),
        exclusion(2, StartsWith, "Update for", "Windows Updates", "Operating system or Office update"),
        exclusion(3, StartsWith, "Hotfix for", "Windows Updates", "Hotfix package"),
        exclusion(4, Contains, "Service Pack", "Windows Updates", "Service pack"),
        exclusion(5, Regex, r"\(KB\d+\)", "Windows Updates", "Knowledge-base patch"),
        exclusion(6, Contains, "Language Pack", "Language Packs", "Localization resources"),
        exclusion(7, Contains, "MUI (", "Language Packs", "Multilingual user interface pack"),
        exclusion(8, Regex, r"\bdrivers?\b", "Drivers", "Hardware driver"),
        exclusion(9, StartsWith, "Intel(R) ", "Drivers", "Chipset or graphics component"),
        exclusion(10, StartsWith, "Realtek ", "Drivers", "Audio or network component"),
        exclusion(11, StartsWith, "Microsoft Visual C++", "Runtimes", "Redistributable runtime"),
        exclusion(12, StartsWith, "Microsoft .NET", "Runtimes", "Framework runtime"),
        exclusion(13, Contains, "Redistributable", "Runtimes", "Redistributable runtime"),
        exclusion(14, EndsWith, "Runtime", "Runtimes", "Shared runtime"),
    ]
}

/// Built-in canonical mappings. More specific patterns come first.
pub fn default_mapping_rules() -> Vec<MappingRule> {
    use DeploymentType::*;
    use PatternType::*;

    vec![
        mapping(1, StartsWith, "AMS360", "AMS360", "Agency Management", Desktop, "Vertafore agency management system"),
        mapping(2, StartsWith, "Applied Epic", "Applied Epic", "Agency Management", SaaS, "Applied Systems agency management"),
        mapping(3, StartsWith, "Google Chrome", "Google Chrome", "Web Browser", Desktop, "Chromium-based browser"),
        mapping(4, StartsWith, "Mozilla Firefox", "Mozilla Firefox", "Web Browser", Desktop, "Mozilla browser"),
        mapping(5, StartsWith, "Microsoft Edge", "Microsoft Edge", "Web Browser", Desktop, "Microsoft browser"),
        mapping(6, StartsWith, "Microsoft Teams", "Microsoft Teams", "Collaboration", Both, "Chat and meetings"),
        mapping(7, Regex, r"^Microsoft (Office|365)\b", "Microsoft 365", "Productivity", Both, "Office productivity suite"),
        mapping(8, StartsWith, "Adobe Acrobat Reader", "Adobe Acrobat Reader", "PDF", Desktop, "Free PDF viewer"),
        mapping(9, StartsWith, "Adobe Acrobat", "Adobe Acrobat", "PDF", Desktop, "PDF editor"),
        mapping(10, Contains, "Zoom", "Zoom", "Collaboration", Both, "Video conferencing"),
        mapping(11, StartsWith, "Slack", "Slack", "Collaboration", Both, "Team messaging"),
        mapping(12, Exact, "7-Zip", "7-Zip", "Utilities", Desktop, "File archiver"),
        mapping(13, Regex, r"^7-Zip \d", "7-Zip", "Utilities", Desktop, "File archiver"),
        mapping(14, StartsWith, "Notepad++", "Notepad++", "Utilities", Desktop, "Text editor"),
    ]
}
