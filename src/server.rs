//! MCP server implementation with tool handlers
//!
//! Registers the six mail tools and renders engine outcomes. Successful
//! reports and soft diagnostics alike return as a single text content block:
//! a missing database file or an unknown address is part of normal operation
//! and is described inside the result, not raised. Only an unknown tool name
//! surfaces as a structured protocol error, which the router produces on its
//! own.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ErrorData, ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};

use crate::config::EnvelopeConfig;
use crate::engine::EnvelopeIndex;
use crate::errors::Diagnostic;
use crate::models::{
    FindSentEmailsInput, SearchAllTablesInput, SearchBySubjectInput, SearchInput,
};

/// Mail envelope MCP server
///
/// Holds the query engine behind an `Arc` so the handler clones cheaply into
/// the rmcp service.
#[derive(Clone)]
pub struct MailEnvelopeServer {
    engine: Arc<EnvelopeIndex>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MailEnvelopeServer {
    /// Create a server around a loaded configuration
    pub fn new(config: EnvelopeConfig) -> Self {
        Self {
            engine: Arc::new(EnvelopeIndex::new(config)),
            tool_router: Self::tool_router(),
        }
    }

    /// Tool: search emails by subject/sender text
    #[tool(
        name = "mail_search",
        description = "Search emails in the local mail envelope database"
    )]
    async fn mail_search(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(text_result(
            self.engine.search_emails(input.query.as_deref(), input.limit),
        ))
    }

    /// Tool: list mail account folders
    #[tool(name = "mail_list_accounts", description = "List all mail accounts")]
    async fn mail_list_accounts(&self) -> Result<CallToolResult, ErrorData> {
        Ok(text_result(self.engine.list_accounts()))
    }

    /// Tool: dump the live database structure
    #[tool(
        name = "mail_examine_database",
        description = "Examine the envelope database structure to find tables and schemas"
    )]
    async fn mail_examine_database(&self) -> Result<CallToolResult, ErrorData> {
        Ok(text_result(self.engine.examine_database()))
    }

    /// Tool: blind search across every candidate table
    #[tool(
        name = "mail_search_all_tables",
        description = "Search for emails across all tables in the envelope database"
    )]
    async fn mail_search_all_tables(
        &self,
        Parameters(input): Parameters<SearchAllTablesInput>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(text_result(
            self.engine
                .search_all_tables(input.date_filter.as_deref(), input.limit),
        ))
    }

    /// Tool: find messages sent by an address
    #[tool(
        name = "mail_find_sent_emails",
        description = "Find emails sent by the user on a specific date"
    )]
    async fn mail_find_sent_emails(
        &self,
        Parameters(input): Parameters<FindSentEmailsInput>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(text_result(self.engine.find_sent_emails(
            input.date_filter.as_deref(),
            input.email_address.as_deref(),
            input.limit,
        )))
    }

    /// Tool: find messages whose subject contains a text
    #[tool(
        name = "mail_search_by_subject",
        description = "Search for emails by subject text on a specific date"
    )]
    async fn mail_search_by_subject(
        &self,
        Parameters(input): Parameters<SearchBySubjectInput>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(text_result(self.engine.search_by_subject(
            &input.subject_text,
            input.date_filter.as_deref(),
            input.limit,
        )))
    }
}

/// Render an engine outcome as one text content block
///
/// Diagnostics are part of normal operation and share the success channel;
/// their `Display` output is the report.
fn text_result(outcome: Result<String, Diagnostic>) -> CallToolResult {
    let text = match outcome {
        Ok(body) => body,
        Err(diagnostic) => diagnostic.to_string(),
    };
    CallToolResult::success(vec![Content::text(text)])
}

/// MCP server handler implementation
#[tool_handler(router = self.tool_router)]
impl ServerHandler for MailEnvelopeServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.instructions = Some(
            "Read-only access to the local mail envelope index. All tools return plain text reports."
                .to_owned(),
        );
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info
    }
}

#[cfg(test)]
mod tests {
    use super::MailEnvelopeServer;

    #[test]
    fn registers_exactly_the_six_mail_tools() {
        let router = MailEnvelopeServer::tool_router();
        let mut names: Vec<String> = router
            .list_all()
            .iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "mail_examine_database",
                "mail_find_sent_emails",
                "mail_list_accounts",
                "mail_search",
                "mail_search_all_tables",
                "mail_search_by_subject",
            ]
        );
    }

    #[test]
    fn unknown_tool_name_is_not_routed() {
        let router = MailEnvelopeServer::tool_router();
        assert!(!router.has_route("mail_delete"));
    }
}
