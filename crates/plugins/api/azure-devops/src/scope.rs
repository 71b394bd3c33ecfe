//! Project scope derived from the organization URL.
//!
//! Two URL shapes are understood:
//!
//! - `https://dev.azure.com/{organization}/{project}[/...]`
//! - `https://{organization}.visualstudio.com/{project}[/...]`

use pilot_core::{AzureDevOpsConfig, Error, Result};
use url::Url;

/// The single project every query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    /// Organization base URL without trailing slash
    org_base: String,
    /// Decoded project name
    project: String,
}

impl ProjectScope {
    /// Create a scope from an already split organization URL and project name.
    pub fn new(org_base: impl Into<String>, project: impl Into<String>) -> Result<Self> {
        let org_base = org_base.into().trim_end_matches('/').to_string();
        let project = project.into().trim().to_string();
        if org_base.is_empty() {
            return Err(Error::Config("Organization URL is empty".to_string()));
        }
        if project.is_empty() {
            return Err(Error::Config("Project name is empty".to_string()));
        }
        Ok(Self { org_base, project })
    }

    /// Derive the scope from an organization URL that embeds the project.
    pub fn from_org_url(org_url: &str) -> Result<Self> {
        let (org_base, project) = split_org_url(org_url)?;
        let project = project.ok_or_else(|| {
            Error::Config(format!(
                "Could not extract project name from organization URL '{}'. \
                 Expected https://dev.azure.com/<organization>/<project>",
                org_url
            ))
        })?;
        Self::new(org_base, project)
    }

    /// Derive the scope from configuration. An explicit `project` wins over
    /// the one embedded in `org_url`.
    pub fn from_config(config: &AzureDevOpsConfig) -> Result<Self> {
        match config.project.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(project) => {
                let (org_base, _) = split_org_url(&config.org_url)?;
                Self::new(org_base, project)
            }
            None => Self::from_org_url(&config.org_url),
        }
    }

    /// Organization base URL, e.g. `https://dev.azure.com/contoso`.
    pub fn org_base(&self) -> &str {
        &self.org_base
    }

    /// Project name as used in WIQL filters.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Project-scoped REST URL for `endpoint` (e.g. `wit/wiql`).
    pub fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/_apis/{}",
            self.org_base,
            urlencoding::encode(&self.project),
            endpoint.trim_start_matches('/')
        )
    }
}

/// Split an organization URL into its base and, if present, the project.
fn split_org_url(org_url: &str) -> Result<(String, Option<String>)> {
    let parsed = Url::parse(org_url.trim()).map_err(|e| {
        Error::Config(format!("Invalid organization URL '{}': {}", org_url, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Invalid organization URL '{}': expected http or https",
            org_url
        )));
    }

    let host = parsed.host_str().ok_or_else(|| {
        Error::Config(format!("Invalid organization URL '{}': missing host", org_url))
    })?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let origin = parsed.origin().ascii_serialization();

    // Legacy hosts carry the organization in the host name.
    let (org_base, project_segment) = if host.ends_with(".visualstudio.com") {
        (origin, segments.first().copied())
    } else {
        let organization = segments.first().ok_or_else(|| {
            Error::Config(format!(
                "Could not extract organization from URL '{}'",
                org_url
            ))
        })?;
        (format!("{}/{}", origin, organization), segments.get(1).copied())
    };

    let project = match project_segment.filter(|seg| !seg.starts_with('_')) {
        Some(seg) => Some(
            urlencoding::decode(seg)
                .map_err(|e| {
                    Error::Config(format!("Invalid project segment '{}': {}", seg, e))
                })?
                .into_owned(),
        ),
        None => None,
    };

    Ok((org_base, project))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ado_config(org_url: &str, project: Option<&str>) -> AzureDevOpsConfig {
        AzureDevOpsConfig {
            org_url: org_url.to_string(),
            project: project.map(str::to_string),
            api_version: "6.0".to_string(),
            token: Some("pat".to_string()),
        }
    }

    #[test]
    fn test_dev_azure_url() {
        let scope = ProjectScope::from_org_url("https://dev.azure.com/contoso/Fabrikam").unwrap();
        assert_eq!(scope.org_base(), "https://dev.azure.com/contoso");
        assert_eq!(scope.project(), "Fabrikam");
        assert_eq!(
            scope.api_url("wit/wiql"),
            "https://dev.azure.com/contoso/Fabrikam/_apis/wit/wiql"
        );
    }

    #[test]
    fn test_trailing_slash_and_extra_segments() {
        let scope =
            ProjectScope::from_org_url("https://dev.azure.com/contoso/Fabrikam/_boards/board/")
                .unwrap();
        assert_eq!(scope.project(), "Fabrikam");
    }

    #[test]
    fn test_percent_encoded_project() {
        let scope =
            ProjectScope::from_org_url("https://dev.azure.com/contoso/Burndown%20Agent").unwrap();
        assert_eq!(scope.project(), "Burndown Agent");
        assert_eq!(
            scope.api_url("/wit/workitems"),
            "https://dev.azure.com/contoso/Burndown%20Agent/_apis/wit/workitems"
        );
    }

    #[test]
    fn test_legacy_visualstudio_url() {
        let scope = ProjectScope::from_org_url("https://contoso.visualstudio.com/Fabrikam").unwrap();
        assert_eq!(scope.org_base(), "https://contoso.visualstudio.com");
        assert_eq!(scope.project(), "Fabrikam");
    }

    #[test]
    fn test_keeps_port_for_local_servers() {
        let scope = ProjectScope::from_org_url("http://127.0.0.1:8080/contoso/Fabrikam").unwrap();
        assert_eq!(scope.org_base(), "http://127.0.0.1:8080/contoso");
    }

    #[test]
    fn test_missing_project_is_config_error() {
        let err = ProjectScope::from_org_url("https://dev.azure.com/contoso").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Could not extract project name"));

        let err = ProjectScope::from_org_url("https://dev.azure.com/contoso/_apis").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_urls() {
        assert!(matches!(
            ProjectScope::from_org_url("not a url"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ProjectScope::from_org_url("dev.azure.com/contoso/Fabrikam"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ProjectScope::from_org_url("ftp://dev.azure.com/contoso/Fabrikam"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ProjectScope::from_org_url("https://dev.azure.com"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_config_prefers_explicit_project() {
        let scope =
            ProjectScope::from_config(&ado_config("https://dev.azure.com/contoso", Some("Ops")))
                .unwrap();
        assert_eq!(scope.org_base(), "https://dev.azure.com/contoso");
        assert_eq!(scope.project(), "Ops");

        let scope = ProjectScope::from_config(&ado_config(
            "https://dev.azure.com/contoso/Fabrikam",
            Some("Ops"),
        ))
        .unwrap();
        assert_eq!(scope.project(), "Ops");
    }

    #[test]
    fn test_from_config_without_project() {
        let scope = ProjectScope::from_config(&ado_config(
            "https://dev.azure.com/contoso/Fabrikam",
            None,
        ))
        .unwrap();
        assert_eq!(scope.project(), "Fabrikam");
    }
}
