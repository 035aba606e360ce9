use crate::archive::ArchiveError;
use url::Url;

/// A validated `https://github.com/<owner>/<repo>` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parses a repository URL, accepting only the strict GitHub shape
    ///
    /// # Accepted shape
    ///
    /// - scheme `https`, host `github.com`, no port, no credentials
    /// - exactly two non-empty path segments: owner and repo
    /// - an optional trailing `/` and an optional `.git` suffix on the repo
    /// - no query string or fragment
    ///
    /// # Examples
    ///
    /// ```
    /// use bucket_ferry::archive::RepoRef;
    ///
    /// let repo = RepoRef::parse("https://github.com/rust-lang/rust").unwrap();
    /// assert_eq!(repo.owner, "rust-lang");
    /// assert_eq!(repo.repo, "rust");
    ///
    /// assert!(RepoRef::parse("https://github.com/rust-lang").is_err());
    /// assert!(RepoRef::parse("https://gitlab.com/rust-lang/rust").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let raw = raw.trim();
        let invalid = |reason: &str| ArchiveError::InvalidRepoUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

        if url.scheme() != "https" {
            return Err(invalid("scheme must be https"));
        }
        if url.host_str() != Some("github.com") {
            return Err(invalid("host must be github.com"));
        }
        if url.port().is_some() {
            return Err(invalid("port is not allowed"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not allowed"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed"));
        }

        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();
        if segments.last() == Some(&"") {
            segments.pop();
        }

        let &[owner, repo] = segments.as_slice() else {
            return Err(invalid("expected exactly https://github.com/<owner>/<repo>"));
        };
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        if !is_valid_name(owner) {
            return Err(invalid("invalid owner name"));
        }
        if !is_valid_name(repo) {
            return Err(invalid("invalid repository name"));
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Download URL of the branch archive, e.g.
    /// `https://github.com/o/r/archive/refs/heads/main.zip`
    pub fn archive_url(&self, download_base: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            download_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            branch
        )
    }

    /// Name of the single top-level directory inside the archive
    ///
    /// GitHub replaces `/` in branch names with `-`.
    pub fn root_dir_name(&self, branch: &str) -> String {
        format!("{}-{}", self.repo, branch.replace('/', "-"))
    }
}

/// GitHub owner and repository names: ASCII letters, digits, `-`, `_`, `.`
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
