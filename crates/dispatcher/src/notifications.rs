use relay_domain::{ContactRecord, Locale, OutboundMessage};

use crate::fanout::NotificationPayload;

/// 联系表单通知模板：给提交者的确认邮件与给管理员的通知邮件
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    site_name: String,
}

impl NotificationComposer {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
        }
    }

    pub fn compose(&self, contact: &ContactRecord) -> NotificationPayload {
        NotificationPayload {
            primary: self.confirmation(contact),
            secondary: self.admin_notification(contact),
        }
    }

    pub fn confirmation(&self, contact: &ContactRecord) -> OutboundMessage {
        let locale = contact.locale();
        let t = |en: &'static str, ar: &'static str| localized(locale, en, ar);
        let site = &self.site_name;

        let subject = match locale {
            Locale::Primary => format!("Thank you for contacting {site}"),
            Locale::Secondary => format!("شكراً لتواصلك مع {site}"),
        };

        let html_body = format!(
            r#"<div dir="{dir}" style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 5px;">
  <h2 style="color: #1a1f71;">{heading}</h2>
  <p>{dear} <strong>{name}</strong>,</p>
  <p>{received}</p>
  <div style="background-color: #f9f9f9; padding: 20px; border-radius: 5px; margin: 20px 0;">
    <h3 style="margin-top: 0; color: #1a1f71;">{details}</h3>
    <p style="margin: 10px 0;"><strong>{subject_label}:</strong> {subject}</p>
    <div style="background: white; padding: 15px; border-radius: 4px; border: 1px solid #e0e0e0;">
      <p style="margin: 0; line-height: 1.6;">{message}</p>
    </div>
  </div>
  <p>{trust}</p>
  <p>{regards},<br><strong>{site}</strong></p>
</div>"#,
            dir = if locale.is_rtl() { "rtl" } else { "ltr" },
            heading = t("Thank you for contacting us", "شكراً لتواصلك معنا"),
            dear = t("Dear", "عزيزي/عزيزتي"),
            name = escape_html(&contact.name),
            received = t(
                "We have received your message and one of our representatives will get back to you as soon as possible.",
                "لقد تلقينا رسالتك بنجاح وسيقوم أحد ممثلينا بالرد عليك في أقرب وقت ممكن.",
            ),
            details = t("Your Message Details", "تفاصيل رسالتك"),
            subject_label = t("Subject", "الموضوع"),
            subject = escape_html(&contact.subject),
            message = escape_multiline(&contact.message),
            trust = t("Thank you for your trust in us.", "شكراً لثقتك بنا."),
            regards = t("Best regards", "مع أطيب التحيات"),
            site = escape_html(site),
        );

        let text_body = format!(
            "{heading}\n\n{subject_label}: {subject}\n\n{message_label}:\n{message}\n\n{regards},\n{site}",
            heading = t("Thank you for contacting us", "شكراً لتواصلك معنا"),
            subject_label = t("Subject", "الموضوع"),
            subject = contact.subject,
            message_label = t("Your Message", "رسالتك"),
            message = contact.message,
            regards = t("Best regards", "مع أطيب التحيات"),
        );

        OutboundMessage {
            subject,
            text_body,
            html_body: Some(html_body),
        }
    }

    pub fn admin_notification(&self, contact: &ContactRecord) -> OutboundMessage {
        let locale = contact.locale();
        let t = |en: &'static str, ar: &'static str| localized(locale, en, ar);

        let subject = match locale {
            Locale::Primary => format!("New Contact Form Submission: {}", contact.subject),
            Locale::Secondary => format!("طلب اتصال جديد: {}", contact.subject),
        };

        let html_body = format!(
            r#"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 5px;">
  <h2 style="color: #1a1f71;">{heading}</h2>
  <div style="background-color: #f9f9f9; padding: 15px; border-radius: 5px; margin: 20px 0;">
    <p style="margin: 5px 0;"><strong>{name_label}:</strong> {name}</p>
    <p style="margin: 5px 0;"><strong>{email_label}:</strong> {email}</p>
    <p style="margin: 5px 0;"><strong>{phone_label}:</strong> {phone}</p>
    <p style="margin: 5px 0;"><strong>{subject_label}:</strong> {subject}</p>
    <p style="margin: 5px 0;"><strong>{message_label}:</strong></p>
    <div style="background: white; padding: 10px; border-radius: 4px; border: 1px solid #e0e0e0;">
      <p style="margin: 0; line-height: 1.6;">{message}</p>
    </div>
    <p style="margin: 5px 0;"><strong>Locale:</strong> {locale_code}</p>
    <p style="margin: 5px 0;"><strong>ID:</strong> {id}</p>
  </div>
  <p style="color: #666; font-size: 0.9em;">{respond}</p>
</div>"#,
            heading = t("New Contact Form Submission", "طلب اتصال جديد"),
            name_label = t("Name", "الاسم"),
            name = escape_html(&contact.name),
            email_label = t("Email", "البريد الإلكتروني"),
            email = escape_html(&contact.email),
            phone_label = t("Phone", "رقم الجوال"),
            phone = escape_html(&contact.phone),
            subject_label = t("Subject", "الموضوع"),
            subject = escape_html(&contact.subject),
            message_label = t("Message", "الرسالة"),
            message = escape_multiline(&contact.message),
            locale_code = contact.locale,
            id = contact.id,
            respond = t(
                "Please respond to this inquiry as soon as possible.",
                "يرجى الرد على هذا الطلب في أقرب وقت ممكن.",
            ),
        );

        let text_body = format!(
            "New Contact Form Submission\n\nName: {}\nEmail: {}\nPhone: {}\nSubject: {}\n\nMessage:\n{}\n\nPlease respond to this inquiry as soon as possible.",
            contact.name, contact.email, contact.phone, contact.subject, contact.message
        );

        OutboundMessage {
            subject,
            text_body,
            html_body: Some(html_body),
        }
    }
}

fn localized(locale: Locale, en: &'static str, ar: &'static str) -> &'static str {
    match locale {
        Locale::Primary => en,
        Locale::Secondary => ar,
    }
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_multiline(input: &str) -> String {
    escape_html(input).replace('\n', "<br>")
}
