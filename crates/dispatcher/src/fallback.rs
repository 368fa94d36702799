use relay_domain::Locale;

/// 兜底回复类别，按匹配优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCategory {
    Greeting,
    Help,
    Services,
    Pricing,
    Contact,
    Thanks,
    Default,
}

const RULES: &[(ReplyCategory, &[&str])] = &[
    (
        ReplyCategory::Greeting,
        &["hello", "hi", "hey", "مرحبا", "اهلا", "السلام"],
    ),
    (ReplyCategory::Help, &["help", "support", "مساعدة", "دعم"]),
    (
        ReplyCategory::Services,
        &["service", "solution", "خدمة", "خدمات", "حل"],
    ),
    (
        ReplyCategory::Pricing,
        &["price", "cost", "سعر", "تكلفة", "اسعار", "بكم"],
    ),
    (
        ReplyCategory::Contact,
        &["contact", "اتصال", "تواصل", "بريد", "هاتف", "ايميل"],
    ),
    (ReplyCategory::Thanks, &["thank", "شكر", "مشكور", "يعطيك"]),
];

/// 所有远程端点失败时使用的本地确定性回复
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFallbackResponder;

impl LocalFallbackResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, text: &str, locale: Locale) -> String {
        reply_text(classify(text), locale).to_string()
    }
}

/// 第一条命中的规则决定类别，全部未命中时为 Default
pub fn classify(text: &str) -> ReplyCategory {
    let normalized = text.trim().to_lowercase();

    for (category, keywords) in RULES {
        if keywords.iter().any(|keyword| normalized.contains(keyword)) {
            return *category;
        }
    }
    ReplyCategory::Default
}

pub fn reply_text(category: ReplyCategory, locale: Locale) -> &'static str {
    match locale {
        Locale::Primary => match category {
            ReplyCategory::Greeting => "Hi there! 👋 Welcome to The Samurai. How can I assist you with cybersecurity or IT solutions today?",
            ReplyCategory::Help => "I'm here to help! You can ask me about our cybersecurity services, IT consulting, pricing, or contact information.",
            ReplyCategory::Services => "We specialize in: Cybersecurity Solutions, IT Consulting, Infrastructure Services, and Cloud Computing.",
            ReplyCategory::Pricing => "Our pricing is customized based on your specific needs. Contact our sales team for a personalized quote.",
            ReplyCategory::Contact => "📧 Email: info@thesamurai.com\n📞 Phone: +966 50 123 4567",
            ReplyCategory::Thanks => "You're welcome! 😊 Is there anything else I can help you with?",
            ReplyCategory::Default => "Thank you for your message! For detailed assistance, please contact our expert team directly.",
        },
        Locale::Secondary => match category {
            ReplyCategory::Greeting => "مرحباً! 👋 أهلاً بكم في The Samurai. كيف يمكنني مساعدتك في حلول الأمن السيبراني وتكنولوجيا المعلومات اليوم؟",
            ReplyCategory::Help => "أنا هنا للمساعدة! يمكنك أن تسألني عن خدمات الأمن السيبراني، استشارات تكنولوجيا المعلومات، الأسعار، أو معلومات الاتصال.",
            ReplyCategory::Services => "نحن متخصصون في: حلول الأمن السيبراني، استشارات تكنولوجيا المعلومات، خدمات البنية التحتية، والحوسبة السحابية.",
            ReplyCategory::Pricing => "أسعارنا مخصصة بناءً على احتياجاتك. اتصل بفريق المبيعات للحصول على عرض أسعار شخصي.",
            ReplyCategory::Contact => "📧 البريد: info@thesamurai.com\n📞 الهاتف: +966 50 123 4567",
            ReplyCategory::Thanks => "على الرحب والسعة! 😊 هل هناك أي شيء آخر يمكنني مساعدتك فيه؟",
            ReplyCategory::Default => "شكراً على رسالتك! للحصول على مساعدة مفصلة، يرجى الاتصال بفريق الخبراء لدينا مباشرة.",
        },
    }
}
