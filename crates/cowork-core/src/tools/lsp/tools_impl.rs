//! The fifteen LSP tools themselves, all thin wrappers translating
//! between the 1-based public position convention and LSP's 0-based
//! one, dispatching through a shared `SessionManager`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lsp_types::{
    request::{
        CallHierarchyIncomingCalls, CallHierarchyOutgoingCalls, CallHierarchyPrepare,
        DocumentSymbolRequest, GotoDefinition, GotoImplementation, HoverRequest, References,
        Request as LspRequest, WorkspaceSymbolRequest,
    },
    CallHierarchyIncomingCallsParams, CallHierarchyItem, CallHierarchyOutgoingCallsParams,
    CallHierarchyPrepareParams, DocumentSymbolParams, DocumentSymbolResponse, GotoDefinitionParams,
    GotoDefinitionResponse, Hover, HoverParams, Location, Position, ReferenceContext,
    ReferenceParams, TextDocumentIdentifier, TextDocumentPositionParams, WorkspaceSymbolParams,
};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::uri::uri_to_path;
use super::SessionManager;

pub fn all_tools(manager: SessionManager) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(WorkspaceInfo { manager: manager.clone() }),
        Arc::new(HoverTool { manager: manager.clone() }),
        Arc::new(DefinitionTool { manager: manager.clone() }),
        Arc::new(ReferencesTool { manager: manager.clone() }),
        Arc::new(DocumentSymbolsTool { manager: manager.clone() }),
        Arc::new(WorkspaceSymbolsTool { manager: manager.clone() }),
        Arc::new(DiagnosticsTool { manager: manager.clone() }),
        Arc::new(RenameTool { manager: manager.clone() }),
        Arc::new(CodeActionsTool { manager: manager.clone() }),
        Arc::new(FormatTool { manager: manager.clone() }),
        Arc::new(CallHierarchyTool { manager: manager.clone() }),
        Arc::new(TypeHierarchyTool { manager: manager.clone() }),
        Arc::new(ImplementationsTool { manager: manager.clone() }),
        Arc::new(SignatureHelpTool { manager: manager.clone() }),
        Arc::new(InlayHintsTool { manager }),
    ]
}

fn file_position_schema(extra: Value) -> Value {
    let mut props = json!({
        "file_path": { "type": "string" },
        "line": { "type": "integer", "description": "1-based line number" },
        "character": { "type": "integer", "description": "1-based character offset" }
    });
    if let (Value::Object(a), Value::Object(b)) = (&mut props, extra) {
        a.extend(b);
    }
    json!({
        "type": "object",
        "properties": props,
        "required": ["file_path", "line", "character"]
    })
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::ArgumentDecode(format!("{key} is required")))
}

fn required_u32(arguments: &Value, key: &str) -> Result<u32, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| ToolError::ArgumentDecode(format!("{key} is required")))
        .map(|v| v as u32)
}

/// 1-based public position -> 0-based LSP `Position`.
fn to_lsp_position(line: u32, character: u32) -> Position {
    Position::new(line.saturating_sub(1), character.saturating_sub(1))
}

fn format_location(location: &Location) -> Value {
    json!({
        "file": uri_to_path(location.uri.as_str()),
        "line": location.range.start.line + 1,
        "character": location.range.start.character + 1,
        "end_line": location.range.end.line + 1,
        "end_character": location.range.end.character + 1,
    })
}

fn format_call_hierarchy_item(item: &CallHierarchyItem) -> Value {
    json!({
        "name": item.name,
        "kind": format!("{:?}", item.kind),
        "file": uri_to_path(item.uri.as_str()),
        "line": item.range.start.line + 1,
        "character": item.range.start.character + 1,
        "detail": item.detail,
    })
}

async fn open_and_identify(
    manager: &SessionManager,
    file_path: &str,
) -> Result<(Arc<super::LspSession>, PathBuf, String), ToolError> {
    let path = PathBuf::from(file_path);
    let session = manager.session_for(&path).await?;
    let uri = session.ensure_open(&path).await?;
    Ok((session, path, uri))
}

struct WorkspaceInfo {
    manager: SessionManager,
}

impl Tool for WorkspaceInfo {
    fn name(&self) -> &str {
        "lsp_workspace_info"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Report the capabilities and server info of the language server handling a file, \
         starting it if not already running."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP workspace info".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "file_path": { "type": "string" } }, "required": ["file_path"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let session = self.manager.session_for(Path::new(file_path)).await?;
            Ok(json!({
                "capabilities": session.capabilities(),
                "server_info": session.server_info(),
            }))
        })
    }
}

struct HoverTool {
    manager: SessionManager,
}

impl Tool for HoverTool {
    fn name(&self) -> &str {
        "lsp_hover"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Show type/documentation info for the symbol at a position."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP hover".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;

            let params = HoverParams {
                text_document_position_params: TextDocumentPositionParams {
                    text_document: TextDocumentIdentifier::new(parse_uri(&uri)?),
                    position: to_lsp_position(line, character),
                },
                work_done_progress_params: Default::default(),
            };
            let result = session.send_request(HoverRequest::METHOD, to_value(&params)?).await?;
            let hover: Option<Hover> = serde_json::from_value(result).unwrap_or(None);
            Ok(match hover {
                None => json!({ "content": null }),
                Some(h) => json!({ "content": format_hover_contents(h) }),
            })
        })
    }
}

fn format_hover_contents(hover: Hover) -> String {
    match hover.contents {
        lsp_types::HoverContents::Scalar(marked) => format_marked_string(marked),
        lsp_types::HoverContents::Array(arr) => {
            arr.into_iter().map(format_marked_string).collect::<Vec<_>>().join("\n\n")
        }
        lsp_types::HoverContents::Markup(markup) => markup.value,
    }
}

fn format_marked_string(marked: lsp_types::MarkedString) -> String {
    match marked {
        lsp_types::MarkedString::String(s) => s,
        lsp_types::MarkedString::LanguageString(ls) => format!("```{}\n{}\n```", ls.language, ls.value),
    }
}

struct DefinitionTool {
    manager: SessionManager,
}

impl Tool for DefinitionTool {
    fn name(&self) -> &str {
        "lsp_definition"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Find where the symbol at a position is defined."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP definition".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;

            let params = GotoDefinitionParams {
                text_document_position_params: TextDocumentPositionParams {
                    text_document: TextDocumentIdentifier::new(parse_uri(&uri)?),
                    position: to_lsp_position(line, character),
                },
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            };
            let result = session.send_request(GotoDefinition::METHOD, to_value(&params)?).await?;
            let response: Option<GotoDefinitionResponse> = serde_json::from_value(result).unwrap_or(None);
            Ok(format_definition_response(response))
        })
    }
}

fn format_definition_response(result: Option<GotoDefinitionResponse>) -> Value {
    match result {
        None => json!({ "definitions": [] }),
        Some(GotoDefinitionResponse::Scalar(loc)) => json!({ "definitions": [format_location(&loc)] }),
        Some(GotoDefinitionResponse::Array(locs)) => {
            json!({ "definitions": locs.iter().map(format_location).collect::<Vec<_>>() })
        }
        Some(GotoDefinitionResponse::Link(links)) => json!({
            "definitions": links.into_iter().map(|l| json!({
                "file": uri_to_path(l.target_uri.as_str()),
                "line": l.target_range.start.line + 1,
                "character": l.target_range.start.character + 1,
            })).collect::<Vec<_>>()
        }),
    }
}

struct ReferencesTool {
    manager: SessionManager,
}

impl Tool for ReferencesTool {
    fn name(&self) -> &str {
        "lsp_references"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Find every reference to the symbol at a position, including its declaration."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP references".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;

            let params = ReferenceParams {
                text_document_position: TextDocumentPositionParams {
                    text_document: TextDocumentIdentifier::new(parse_uri(&uri)?),
                    position: to_lsp_position(line, character),
                },
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
                context: ReferenceContext { include_declaration: true },
            };
            let result = session.send_request(References::METHOD, to_value(&params)?).await?;
            let locations: Option<Vec<Location>> = serde_json::from_value(result).unwrap_or(None);
            Ok(json!({ "references": locations.unwrap_or_default().iter().map(format_location).collect::<Vec<_>>() }))
        })
    }
}

struct DocumentSymbolsTool {
    manager: SessionManager,
}

impl Tool for DocumentSymbolsTool {
    fn name(&self) -> &str {
        "lsp_document_symbols"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "List every symbol declared in a file."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP document symbols".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "file_path": { "type": "string" } }, "required": ["file_path"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;

            let params = DocumentSymbolParams {
                text_document: TextDocumentIdentifier::new(parse_uri(&uri)?),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            };
            let result = session.send_request(DocumentSymbolRequest::METHOD, to_value(&params)?).await?;
            let response: Option<DocumentSymbolResponse> = serde_json::from_value(result).unwrap_or(None);
            Ok(format_document_symbols(response))
        })
    }
}

fn format_document_symbols(result: Option<DocumentSymbolResponse>) -> Value {
    match result {
        None => json!({ "symbols": [] }),
        Some(DocumentSymbolResponse::Flat(symbols)) => json!({
            "symbols": symbols.into_iter().map(|s| json!({
                "name": s.name,
                "kind": format!("{:?}", s.kind),
                "line": s.location.range.start.line + 1,
                "character": s.location.range.start.character + 1,
            })).collect::<Vec<_>>()
        }),
        Some(DocumentSymbolResponse::Nested(symbols)) => json!({ "symbols": format_nested_symbols(symbols) }),
    }
}

fn format_nested_symbols(symbols: Vec<lsp_types::DocumentSymbol>) -> Vec<Value> {
    symbols
        .into_iter()
        .map(|s| {
            let mut obj = json!({
                "name": s.name,
                "kind": format!("{:?}", s.kind),
                "line": s.range.start.line + 1,
                "character": s.range.start.character + 1,
            });
            if let Some(children) = s.children {
                obj["children"] = json!(format_nested_symbols(children));
            }
            obj
        })
        .collect()
}

struct WorkspaceSymbolsTool {
    manager: SessionManager,
}

impl Tool for WorkspaceSymbolsTool {
    fn name(&self) -> &str {
        "lsp_workspace_symbols"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Search for symbols by name across the whole workspace."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP workspace symbols".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "file_path": { "type": "string", "description": "any file handled by the target server" }, "query": { "type": "string" } },
            "required": ["file_path", "query"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let query = required_str(&arguments, "query")?.to_string();
            let session = self.manager.session_for(Path::new(file_path)).await?;

            let params = WorkspaceSymbolParams {
                query: query.clone(),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            };
            let result = session.send_request(WorkspaceSymbolRequest::METHOD, to_value(&params)?).await?;
            let response: Option<lsp_types::WorkspaceSymbolResponse> = serde_json::from_value(result).unwrap_or(None);
            Ok(json!({
                "query": query,
                "symbols": response.map(|r| match r {
                    lsp_types::WorkspaceSymbolResponse::Flat(symbols) => symbols.into_iter().map(|s| json!({
                        "name": s.name,
                        "kind": format!("{:?}", s.kind),
                        "location": format_location(&s.location),
                    })).collect::<Vec<_>>(),
                    lsp_types::WorkspaceSymbolResponse::Nested(symbols) => symbols.into_iter().map(|s| json!({
                        "name": s.name,
                        "kind": format!("{:?}", s.kind),
                    })).collect::<Vec<_>>(),
                }).unwrap_or_default()
            }))
        })
    }
}

struct DiagnosticsTool {
    manager: SessionManager,
}

impl Tool for DiagnosticsTool {
    fn name(&self) -> &str {
        "lsp_diagnostics"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Read current diagnostics for a file. On first open, waits briefly (best effort) \
         for the server to publish its first diagnostics pass."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP diagnostics".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "file_path": { "type": "string" } }, "required": ["file_path"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let path = PathBuf::from(file_path);
            let session = self.manager.session_for(&path).await?;
            let since = session.diagnostics_version();
            let uri = session.ensure_open(&path).await?;
            session.wait_for_fresh_diagnostics(since).await;
            Ok(json!({ "diagnostics": session.diagnostics_for(&uri) }))
        })
    }
}

struct RenameTool {
    manager: SessionManager,
}

impl Tool for RenameTool {
    fn name(&self) -> &str {
        "lsp_rename"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Rename the symbol at a position everywhere it's used, applying the server's \
         returned edits to files on disk and summarizing per-file edit counts."
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({ "new_name": { "type": "string" } }))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let new_name = required_str(&arguments, "new_name")?.to_string();
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;
            let position = to_lsp_position(line, character);

            let params = json!({
                "textDocument": { "uri": uri },
                "position": { "line": position.line, "character": position.character },
                "newName": new_name,
            });
            let result = session.send_request("textDocument/rename", params).await?;
            apply_workspace_edit(&session, &result).await
        })
    }
}

async fn apply_workspace_edit(session: &super::LspSession, edit: &Value) -> Result<Value, ToolError> {
    let changes = edit.get("changes").and_then(|c| c.as_object());
    let Some(changes) = changes else {
        return Ok(json!({ "applied": false, "files": [] }));
    };

    let mut summary = Vec::new();
    for (uri, edits) in changes {
        let Some(edits) = edits.as_array() else { continue };
        let path = uri_to_path(uri);
        let original = tokio::fs::read_to_string(&path).await.map_err(ToolError::Io)?;
        let mut lines: Vec<String> = original.split('\n').map(String::from).collect();

        let mut sorted_edits: Vec<&Value> = edits.iter().collect();
        sorted_edits.sort_by(|a, b| {
            let pos = |e: &Value| (e["range"]["start"]["line"].as_u64().unwrap_or(0), e["range"]["start"]["character"].as_u64().unwrap_or(0));
            pos(b).cmp(&pos(a))
        });

        for e in &sorted_edits {
            let start_line = e["range"]["start"]["line"].as_u64().unwrap_or(0) as usize;
            let start_char = e["range"]["start"]["character"].as_u64().unwrap_or(0) as usize;
            let end_line = e["range"]["end"]["line"].as_u64().unwrap_or(0) as usize;
            let end_char = e["range"]["end"]["character"].as_u64().unwrap_or(0) as usize;
            let new_text = e["newText"].as_str().unwrap_or_default();

            if start_line >= lines.len() || end_line >= lines.len() {
                continue;
            }
            let prefix = lines[start_line].chars().take(start_char).collect::<String>();
            let suffix = lines[end_line].chars().skip(end_char).collect::<String>();
            let replacement = format!("{prefix}{new_text}{suffix}");
            lines.splice(start_line..=end_line, replacement.split('\n').map(String::from));
        }

        let new_text = lines.join("\n");
        tokio::fs::write(&path, &new_text).await.map_err(ToolError::Io)?;
        session.notify_changed(uri, &new_text).await?;
        summary.push(json!({ "file": path, "edits": sorted_edits.len() }));
    }

    Ok(json!({ "applied": true, "files": summary }))
}

struct CodeActionsTool {
    manager: SessionManager,
}

impl Tool for CodeActionsTool {
    fn name(&self) -> &str {
        "lsp_code_actions"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "List available code actions (quick fixes, refactors) at a position or range."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP code actions".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;
            let position = to_lsp_position(line, character);

            let params = json!({
                "textDocument": { "uri": uri },
                "range": {
                    "start": { "line": position.line, "character": position.character },
                    "end": { "line": position.line, "character": position.character },
                },
                "context": { "diagnostics": session.diagnostics_for(&uri) },
            });
            let result = session.send_request("textDocument/codeAction", params).await?;
            Ok(json!({ "actions": result }))
        })
    }
}

struct FormatTool {
    manager: SessionManager,
}

impl Tool for FormatTool {
    fn name(&self) -> &str {
        "lsp_format"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Format a whole file and apply the server's returned edits to disk."
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "file_path": { "type": "string" } }, "required": ["file_path"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;

            let params = json!({
                "textDocument": { "uri": uri },
                "options": { "tabSize": 4, "insertSpaces": true },
            });
            let result = session.send_request("textDocument/formatting", params).await?;
            let edits = result.as_array().cloned().unwrap_or_default();
            apply_workspace_edit(&session, &json!({ "changes": { uri.clone(): edits } })).await
        })
    }
}

struct CallHierarchyTool {
    manager: SessionManager,
}

impl Tool for CallHierarchyTool {
    fn name(&self) -> &str {
        "lsp_call_hierarchy"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Show incoming callers and outgoing callees of the function at a position."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP call hierarchy".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;

            let prepare_params = CallHierarchyPrepareParams {
                text_document_position_params: TextDocumentPositionParams {
                    text_document: TextDocumentIdentifier::new(parse_uri(&uri)?),
                    position: to_lsp_position(line, character),
                },
                work_done_progress_params: Default::default(),
            };
            let result = session.send_request(CallHierarchyPrepare::METHOD, to_value(&prepare_params)?).await?;
            let items: Option<Vec<CallHierarchyItem>> = serde_json::from_value(result).unwrap_or(None);
            let Some(items) = items.filter(|i| !i.is_empty()) else {
                return Ok(json!({ "incoming_calls": [], "outgoing_calls": [], "message": "no call hierarchy item at position" }));
            };
            let item = items.into_iter().next().unwrap();

            let incoming_params = CallHierarchyIncomingCallsParams {
                item: item.clone(),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            };
            let incoming = session.send_request(CallHierarchyIncomingCalls::METHOD, to_value(&incoming_params)?).await?;
            let incoming: Option<Vec<lsp_types::CallHierarchyIncomingCall>> = serde_json::from_value(incoming).unwrap_or(None);

            let outgoing_params = CallHierarchyOutgoingCallsParams {
                item,
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            };
            let outgoing = session.send_request(CallHierarchyOutgoingCalls::METHOD, to_value(&outgoing_params)?).await?;
            let outgoing: Option<Vec<lsp_types::CallHierarchyOutgoingCall>> = serde_json::from_value(outgoing).unwrap_or(None);

            Ok(json!({
                "incoming_calls": incoming.unwrap_or_default().into_iter().map(|c| json!({
                    "from": format_call_hierarchy_item(&c.from),
                })).collect::<Vec<_>>(),
                "outgoing_calls": outgoing.unwrap_or_default().into_iter().map(|c| json!({
                    "to": format_call_hierarchy_item(&c.to),
                })).collect::<Vec<_>>(),
            }))
        })
    }
}

struct TypeHierarchyTool {
    manager: SessionManager,
}

impl Tool for TypeHierarchyTool {
    fn name(&self) -> &str {
        "lsp_type_hierarchy"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Show supertypes and subtypes of the type at a position."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP type hierarchy".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;
            let position = to_lsp_position(line, character);

            let prepare_params = json!({
                "textDocument": { "uri": uri },
                "position": { "line": position.line, "character": position.character },
            });
            let items = session.send_request("typeHierarchy/prepare", prepare_params).await?;
            let Some(item) = items.as_array().and_then(|a| a.first()).cloned() else {
                return Ok(json!({ "supertypes": [], "subtypes": [], "message": "no type hierarchy item at position" }));
            };

            let supertypes = session
                .send_request("typeHierarchy/supertypes", json!({ "item": item }))
                .await
                .unwrap_or(Value::Null);
            let subtypes = session
                .send_request("typeHierarchy/subtypes", json!({ "item": item }))
                .await
                .unwrap_or(Value::Null);

            Ok(json!({ "supertypes": supertypes, "subtypes": subtypes }))
        })
    }
}

struct ImplementationsTool {
    manager: SessionManager,
}

impl Tool for ImplementationsTool {
    fn name(&self) -> &str {
        "lsp_implementations"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Find implementations of the interface/trait at a position."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP implementations".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;

            let params = GotoDefinitionParams {
                text_document_position_params: TextDocumentPositionParams {
                    text_document: TextDocumentIdentifier::new(parse_uri(&uri)?),
                    position: to_lsp_position(line, character),
                },
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            };
            let result = session.send_request(GotoImplementation::METHOD, to_value(&params)?).await?;
            let response: Option<GotoDefinitionResponse> = serde_json::from_value(result).unwrap_or(None);
            Ok(format_definition_response(response))
        })
    }
}

struct SignatureHelpTool {
    manager: SessionManager,
}

impl Tool for SignatureHelpTool {
    fn name(&self) -> &str {
        "lsp_signature_help"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "Show the signature and active parameter for a call at a position."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP signature help".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        file_position_schema(json!({}))
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let line = required_u32(&arguments, "line")?;
            let character = required_u32(&arguments, "character")?;
            let (session, _, uri) = open_and_identify(&self.manager, file_path).await?;
            let position = to_lsp_position(line, character);

            let params = json!({
                "textDocument": { "uri": uri },
                "position": { "line": position.line, "character": position.character },
            });
            let result = session.send_request("textDocument/signatureHelp", params).await?;
            Ok(json!({ "signature_help": result }))
        })
    }
}

struct InlayHintsTool {
    manager: SessionManager,
}

impl Tool for InlayHintsTool {
    fn name(&self) -> &str {
        "lsp_inlay_hints"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Lsp
    }
    fn description(&self) -> &str {
        "List inlay hints (inferred types, parameter names) for a file."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("LSP inlay hints".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "file_path": { "type": "string" } }, "required": ["file_path"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let file_path = required_str(&arguments, "file_path")?;
            let (session, path, uri) = open_and_identify(&self.manager, file_path).await?;
            let text = tokio::fs::read_to_string(&path).await.map_err(ToolError::Io)?;
            let line_count = text.split('\n').count() as u32;

            let params = json!({
                "textDocument": { "uri": uri },
                "range": {
                    "start": { "line": 0, "character": 0 },
                    "end": { "line": line_count.saturating_sub(1), "character": 0 },
                },
            });
            let result = session.send_request("textDocument/inlayHint", params).await?;
            Ok(json!({ "hints": result }))
        })
    }
}

fn to_value<T: serde::Serialize>(params: &T) -> Result<Value, ToolError> {
    serde_json::to_value(params).map_err(|e| ToolError::Fatal(e.to_string()))
}

fn parse_uri(uri: &str) -> Result<lsp_types::Url, ToolError> {
    uri.parse().map_err(|e| ToolError::Fatal(format!("invalid uri {uri}: {e}")))
}
