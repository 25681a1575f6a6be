use futures::stream::BoxStream;
use futures::{Future, TryStreamExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::errors::{AgentError, AgentResult, ChatError, ChatResult};
use crate::location::LocationContext;
use crate::models::message::{Message, ToolRequest};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};
use crate::models::transcript::Transcript;
use crate::prompt_template::{system_prompt, SystemPromptContext};
use crate::providers::base::{Completion, FinishReason, Provider};
use crate::tools::{ToolName, ToolRegistry};

/// Name recorded on the result of a tool request the model sent in unusable form
const UNPARSED_TOOL: &str = "invalid_tool_call";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Rounds of tool execution allowed before the reply is abandoned
    pub max_tool_rounds: usize,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
    /// How many restaurants the model is asked to recommend
    pub recommendations: usize,
    /// Replaces the built-in system prompt template
    pub system_prompt: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            model_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(15),
            recommendations: 3,
            system_prompt: None,
        }
    }
}

/// The outcome of one conversation
#[derive(Debug, Clone)]
pub struct Reply {
    /// Text of the final assistant message
    pub content: String,
    pub transcript: Transcript,
}

/// Agent integrates a foundational LLM with the tools it may call
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: ToolRegistry,
    config: AgentConfig,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, registry: ToolRegistry) -> Self {
        Self {
            provider,
            registry,
            config: AgentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn get_system_prompt(&self) -> AgentResult<String> {
        let context = SystemPromptContext {
            restaurant_tool: ToolName::GetRestaurant.to_string(),
            forecast_tool: ToolName::GetForecast.to_string(),
            recommendations: self.config.recommendations,
        };
        system_prompt(self.config.system_prompt.as_ref(), &context)
            .map_err(|e| AgentError::Internal(e.to_string()))
    }

    /// The opening transcript: instructions followed by the user's prompt
    fn seed(&self, prompt: &str) -> AgentResult<Transcript> {
        let mut transcript = Transcript::new();
        transcript.push(Message::system().with_text(self.get_system_prompt()?));
        transcript.push(Message::user().with_text(prompt));
        Ok(transcript)
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> ChatResult<Completion> {
        let call = timeout(self.config.model_timeout, self.provider.complete(messages, tools));
        match cancellable(cancel, call).await? {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(e)) => Err(ChatError::Provider(e)),
            Err(_) => Err(ChatError::ModelTimeout(self.config.model_timeout)),
        }
    }

    /// Decide whether a requested call may run, counting it against the tool's per-request limit.
    ///
    /// Only calls that name a known tool and pass its schema are counted, so a
    /// rejected call does not use up the allowance for the corrected one.
    fn admit(
        &self,
        request: &ToolRequest,
        calls_made: &mut HashMap<String, usize>,
    ) -> (String, AgentResult<ToolCall>) {
        let call = match &request.tool_call {
            Ok(call) => call.clone(),
            Err(e) => return (UNPARSED_TOOL.to_string(), Err(e.clone())),
        };

        let definition = match self.registry.get(&call.name) {
            Some(definition) => definition,
            None => {
                let name = call.name.clone();
                return (name, Err(AgentError::ToolNotFound(call.name)));
            }
        };
        if let Err(e) = definition.schema().validate(&call.arguments) {
            return (call.name.clone(), Err(e));
        }

        let made = calls_made.entry(call.name.clone()).or_default();
        if let Some(limit) = definition.call_limit() {
            if *made >= limit {
                return (
                    call.name.clone(),
                    Err(AgentError::CallLimit {
                        name: call.name,
                        limit,
                    }),
                );
            }
        }
        *made += 1;
        (call.name.clone(), Ok(call))
    }

    /// Run a single tool call, always producing a tool result message for `id`
    async fn dispatch_tool_call(
        &self,
        id: String,
        name: String,
        call: AgentResult<ToolCall>,
        location: LocationContext,
    ) -> Message {
        let call = match call {
            Ok(call) => call,
            Err(e) => return Message::tool().with_tool_response(id, name, Err(e)),
        };

        let invocation = self.registry.invoke(&id, &call, &location);
        match timeout(self.config.tool_timeout, invocation).await {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => {
                tracing::warn!(tool = %name, error = %e, "tool call rejected");
                Message::tool().with_tool_response(id, name, Err(e))
            }
            Err(_) => {
                tracing::warn!(tool = %name, "tool call timed out");
                Message::tool().with_tool_response(id, name, Err(AgentError::Timeout(call.name)))
            }
        }
    }

    /// Create a stream that yields each message as it's added to the transcript.
    ///
    /// The stream starts with the system and user messages, then every assistant
    /// response and tool result in order, and ends after the assistant message that
    /// requests no tools. Dropping the stream or cancelling `cancel` stops the loop.
    pub fn reply<'a>(
        &'a self,
        prompt: &'a str,
        location: LocationContext,
        cancel: CancellationToken,
    ) -> BoxStream<'a, ChatResult<Message>> {
        Box::pin(async_stream::try_stream! {
            let mut transcript = self.seed(prompt).map_err(ChatError::from)?;
            for message in transcript.messages() {
                yield message.clone();
            }

            let tools = self.registry.tools();
            let mut calls_made: HashMap<String, usize> = HashMap::new();
            let mut rounds = 0;

            loop {
                if cancel.is_cancelled() {
                    Err::<(), _>(ChatError::Cancelled)?;
                }

                let completion = self.complete(transcript.messages(), &tools, &cancel).await?;
                let response = completion.message;
                transcript.push(response.clone());
                yield response.clone();

                let tool_requests = response.tool_requests();
                if tool_requests.is_empty() {
                    if completion.finish_reason == FinishReason::ToolCalls {
                        tracing::warn!("model reported tool_calls but requested none");
                    }
                    break;
                }

                rounds += 1;
                if rounds > self.config.max_tool_rounds {
                    Err::<(), _>(ChatError::ToolLoopExceeded {
                        max_rounds: self.config.max_tool_rounds,
                    })?;
                }
                tracing::debug!(round = rounds, calls = tool_requests.len(), "executing tools");

                // Dispatch concurrently, but keep the results in request order
                let futures: Vec<_> = tool_requests
                    .iter()
                    .map(|request| {
                        let (name, call) = self.admit(request, &mut calls_made);
                        self.dispatch_tool_call(request.id.clone(), name, call, location)
                    })
                    .collect();
                let outputs = cancellable(&cancel, futures::future::join_all(futures)).await?;

                for output in outputs {
                    transcript.push(output.clone());
                    yield output;
                }
            }
        })
    }

    /// Run the conversation to completion and return the final answer with its transcript
    pub async fn respond(
        &self,
        prompt: &str,
        location: LocationContext,
        cancel: CancellationToken,
    ) -> ChatResult<Reply> {
        let mut stream = self.reply(prompt, location, cancel);
        let mut transcript = Transcript::new();
        while let Some(message) = stream.try_next().await? {
            transcript.push(message);
        }

        let content = transcript
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(Message::text)
            .unwrap_or_default();
        Ok(Reply {
            content,
            transcript,
        })
    }
}

async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> ChatResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ChatError::Cancelled),
        output = future => Ok(output),
    }
}
