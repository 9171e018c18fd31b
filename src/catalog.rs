//! Tool catalog — the static registry of AI tools a workspace can host.
//!
//! DESIGN
//! ======
//! Tools are defined once at process start and never mutated. Widgets hold
//! only a `tool_id`; resolving it is a fallible lookup, and a miss turns the
//! widget into a ghost rather than an error.

use serde::{Deserialize, Serialize};

// =============================================================================
// TYPES
// =============================================================================

/// Closed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Text,
    Video,
    Audio,
    Image,
    Dev,
    Productivity,
    Agent,
    Automation,
}

impl ToolCategory {
    pub const ALL: [Self; 8] = [
        Self::Text,
        Self::Video,
        Self::Audio,
        Self::Image,
        Self::Dev,
        Self::Productivity,
        Self::Agent,
        Self::Automation,
    ];

    /// Display label shown by the catalog browser.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Texto",
            Self::Video => "Vídeo",
            Self::Audio => "Áudio",
            Self::Image => "Imagens",
            Self::Dev => "Dev",
            Self::Productivity => "Produtividade",
            Self::Agent => "Agente",
            Self::Automation => "Automação",
        }
    }

    /// Parse either the wire name (`"text"`) or the display label (`"Texto"`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| {
            let wire = format!("{c:?}");
            wire.eq_ignore_ascii_case(raw) || c.label() == raw
        })
    }
}

/// Immutable descriptor of one AI tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ToolCategory,
    pub description: &'static str,
    pub url: &'static str,
    pub icon: &'static str,
    /// `true` when replies come from the Response Provider instead of a simulation.
    pub is_native_integration: bool,
}

// =============================================================================
// BUILT-IN TOOLS
// =============================================================================

pub const AI_TOOLS: &[Tool] = &[
    Tool {
        id: "IA-0004",
        name: "Gemini",
        category: ToolCategory::Text,
        description: "Modelo multimodal avançado do Google. Integra texto, código, e raciocínio complexo com grande janela de contexto.",
        url: "https://gemini.google.com/",
        icon: "smart_toy",
        is_native_integration: true,
    },
    Tool {
        id: "IA-0001",
        name: "ChatGPT",
        category: ToolCategory::Text,
        description: "O assistente clássico da OpenAI. Excelente para criatividade, redação e tarefas gerais de conversação.",
        url: "https://chat.openai.com/",
        icon: "chat",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0003",
        name: "Claude",
        category: ToolCategory::Text,
        description: "Conhecido por sua escrita natural e capacidades de codificação seguras e explicativas.",
        url: "https://claude.ai/",
        icon: "description",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0002",
        name: "Grok",
        category: ToolCategory::Text,
        description: "Chatbot com acesso em tempo real a dados do X (Twitter) e uma personalidade espirituosa.",
        url: "https://grok.com/",
        icon: "rocket_launch",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0020",
        name: "Cursor",
        category: ToolCategory::Dev,
        description: "O editor de código do futuro. Um fork do VS Code com IA nativa para autocompletar e refatorar.",
        url: "https://cursor.sh/",
        icon: "code",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0009",
        name: "Midjourney",
        category: ToolCategory::Image,
        description: "A referência em geração de imagens artísticas de alta fidelidade via prompt de texto.",
        url: "https://midjourney.com/",
        icon: "palette",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0090",
        name: "Sora",
        category: ToolCategory::Video,
        description: "Criação de vídeos realistas a partir de texto (Simulação/Acesso Limitado).",
        url: "https://openai.com/sora",
        icon: "movie",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0014",
        name: "ElevenLabs",
        category: ToolCategory::Audio,
        description: "Síntese de voz ultra-realista e clonagem de voz para criadores de conteúdo.",
        url: "https://elevenlabs.io/",
        icon: "graphic_eq",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0036",
        name: "Mem",
        category: ToolCategory::Productivity,
        description: "Um espaço de trabalho auto-organizável. O \"cérebro digital\" que conecta suas notas.",
        url: "https://mem.ai/",
        icon: "memory",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0022",
        name: "Vercel v0",
        category: ToolCategory::Dev,
        description: "Gere interfaces de usuário (UI) React/Tailwind instantaneamente a partir de descrições.",
        url: "https://v0.dev/",
        icon: "web",
        is_native_integration: false,
    },
    Tool {
        id: "IA-0043",
        name: "Canva Magic",
        category: ToolCategory::Image,
        description: "Suite completa de design com ferramentas mágicas de IA para edição e criação.",
        url: "https://www.canva.com/",
        icon: "brush",
        is_native_integration: false,
    },
];

// =============================================================================
// LOOKUP
// =============================================================================

/// Read-only view over a set of tools.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    tools: &'static [Tool],
}

impl Catalog {
    #[must_use]
    pub fn builtin() -> Self {
        Self { tools: AI_TOOLS }
    }

    #[must_use]
    pub fn tools(&self) -> &'static [Tool] {
        self.tools
    }

    /// Resolve a widget's weak tool reference. `None` means the widget is a ghost.
    #[must_use]
    pub fn find(&self, tool_id: &str) -> Option<&'static Tool> {
        self.tools.iter().find(|t| t.id == tool_id)
    }

    /// Case-insensitive match on name or description, optionally narrowed to a category.
    #[must_use]
    pub fn search(&self, term: &str, category: Option<ToolCategory>) -> Vec<&'static Tool> {
        let needle = term.trim().to_lowercase();
        self.tools()
            .iter()
            .filter(|t| category.is_none_or(|c| t.category == c))
            .filter(|t| {
                needle.is_empty()
                    || t.name.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// `true` if `id` has the catalog shape `IA-dddd`.
#[must_use]
pub fn is_valid_tool_id(id: &str) -> bool {
    id.strip_prefix("IA-")
        .is_some_and(|digits| digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
