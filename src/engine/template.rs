//! Chat-template rendering of message turns into engine-ready prompt text.

use crate::prompts::ChatMessage;

/// Renders a conversation into the prompt text a model was trained on.
pub trait ChatTemplate {
    /// Render `messages` into prompt text.
    ///
    /// With `add_generation_prompt` the rendered text ends with an opened
    /// assistant turn, cueing the model to generate. `enable_reasoning`
    /// controls whether that turn leaves room for an extended reasoning
    /// block; when disabled, an empty block is emitted so reasoning-tuned
    /// models skip straight to the answer.
    fn format(
        &self,
        messages: &[ChatMessage],
        add_generation_prompt: bool,
        enable_reasoning: bool,
    ) -> String;
}

/// ChatML template (`<|im_start|>role ... <|im_end|>`), used by the Qwen
/// family among others.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatMlTemplate;

impl ChatMlTemplate {
    pub fn new() -> Self {
        Self
    }
}

impl ChatTemplate for ChatMlTemplate {
    fn format(
        &self,
        messages: &[ChatMessage],
        add_generation_prompt: bool,
        enable_reasoning: bool,
    ) -> String {
        let mut out = String::new();
        for message in messages {
            out.push_str("<|im_start|>");
            out.push_str(message.role.as_str());
            out.push('\n');
            out.push_str(&message.content);
            out.push_str("<|im_end|>\n");
        }
        if add_generation_prompt {
            out.push_str("<|im_start|>assistant\n");
            if !enable_reasoning {
                out.push_str("<think>\n\n</think>\n\n");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::ChatRole;

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: ChatRole::System,
                content: "You are concise.".into(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: "Say hi.".into(),
            },
        ]
    }

    #[test]
    fn renders_roles_and_content_in_order() {
        let text = ChatMlTemplate::new().format(&messages(), false, true);
        assert_eq!(
            text,
            "<|im_start|>system\nYou are concise.<|im_end|>\n\
             <|im_start|>user\nSay hi.<|im_end|>\n"
        );
    }

    #[test]
    fn generation_prompt_opens_assistant_turn() {
        let text = ChatMlTemplate::new().format(&messages(), true, true);
        assert!(text.ends_with("<|im_start|>assistant\n"));
    }

    #[test]
    fn disabled_reasoning_emits_empty_think_block() {
        let text = ChatMlTemplate::new().format(&messages(), true, false);
        assert!(text.ends_with("<|im_start|>assistant\n<think>\n\n</think>\n\n"));
    }
}
