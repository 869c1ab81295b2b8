use rust_decimal::Decimal;

use crate::domain::refund::RefundStatus;
use super::event::*;

// ============================================================================
// Email Templates - pure functions from event to message body
// ============================================================================

/// Store identity used in every template
#[derive(Debug, Clone)]
pub struct Branding {
    pub store_name: String,
    pub account_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
}

pub fn render(event: &NotificationEvent, branding: &Branding) -> EmailMessage {
    match event {
        NotificationEvent::OrderStatus(notice) => order_status(notice, branding),
        NotificationEvent::RefundStatus(notice) => refund_status(notice, branding),
        NotificationEvent::RefundMessage(notice) => refund_message(notice, branding),
        NotificationEvent::OrderConfirmation(order) => order_confirmation(order, branding),
        NotificationEvent::Welcome(notice) => welcome(notice, branding),
        NotificationEvent::AdminNewOrder(order) => admin_new_order(order, branding),
        NotificationEvent::AdminNewRefund(refund) => admin_new_refund(refund, branding),
    }
}

fn order_status(notice: &OrderStatusNotice, branding: &Branding) -> EmailMessage {
    let order = notice.order();
    let code = escape_html(&order.code);

    let (subject, icon, heading, message) = match notice {
        OrderStatusNotice::Pending(_) => (
            format!("Order {} received", order.code),
            "🧾",
            "Order received",
            "We've received your order and it is awaiting confirmation.",
        ),
        OrderStatusNotice::Processing(_) => (
            format!("Order {} is being prepared", order.code),
            "📦",
            "We're preparing your order",
            "Your order is being picked and packed.",
        ),
        OrderStatusNotice::Shipped { .. } => (
            format!("Your order {} is on its way", order.code),
            "🚚",
            "Your order has shipped",
            "Good news! Your order has left our studio.",
        ),
        OrderStatusNotice::Delivered(_) => (
            format!("Order {} delivered", order.code),
            "🏡",
            "Your order has been delivered",
            "Your order has arrived. We hope you love it!",
        ),
        OrderStatusNotice::Cancelled(_) => (
            format!("Order {} cancelled", order.code),
            "❌",
            "Your order has been cancelled",
            "Your order has been cancelled. If you have already paid, a refund will follow.",
        ),
    };

    let mut body = format!(
        "<p>Hi {},</p><p>{}</p><p>Order number: <strong>{}</strong></p>",
        escape_html(&order.customer_name),
        message,
        code
    );

    if let OrderStatusNotice::Shipped { shipping, .. } = notice {
        body.push_str(&shipping_block(shipping.as_ref()));
    }

    body.push_str(&format!(
        "<p>Order total: <strong>{}</strong></p>",
        money(order.total)
    ));

    EmailMessage {
        subject,
        html: layout(branding, icon, heading, &body),
    }
}

fn shipping_block(shipping: Option<&crate::domain::order::ShippingInfo>) -> String {
    let Some(shipping) = shipping else {
        return "<p>Tracking details will follow shortly.</p>".to_string();
    };

    let mut block = format!(
        "<p>Carrier: {}<br>Tracking number: <strong>{}</strong></p>",
        shipping.courier.display_name(),
        escape_html(&shipping.tracking_number)
    );

    match shipping.delivery_days.as_deref() {
        Some(days) => block.push_str(&format!(
            "<p>Estimated delivery: {} business days</p>",
            escape_html(days)
        )),
        None => block.push_str("<p>Delivery times vary by location.</p>"),
    }

    if !shipping.tracking_url.is_empty() {
        block.push_str(&button(&shipping.tracking_url, "Track your parcel"));
    }

    block
}

fn refund_status(notice: &RefundStatusNotice, branding: &Branding) -> EmailMessage {
    let refund = &notice.refund;
    let amount = money(refund.amount);

    let (subject, icon, heading, message) = match notice.status {
        RefundStatus::Pending => (
            format!("Refund request {} received", refund.code),
            "📨",
            "Refund request received",
            "We've received your refund request and will review it shortly.".to_string(),
        ),
        RefundStatus::Reviewing => (
            format!("Refund request {} under review", refund.code),
            "🔍",
            "We're reviewing your request",
            "Our team is reviewing your refund request. We'll be in touch soon.".to_string(),
        ),
        RefundStatus::Approved => (
            format!("Refund request {} approved", refund.code),
            "✅",
            "Refund approved",
            format!("Your refund of {} has been approved and will be processed shortly.", amount),
        ),
        RefundStatus::Denied => (
            format!("Update on refund request {}", refund.code),
            "⚠️",
            "Refund request declined",
            "After reviewing your request we are unable to approve this refund. \
             Reply to this email or visit your account if you have questions."
                .to_string(),
        ),
        RefundStatus::Processed => (
            format!("Refund {} processed", refund.code),
            "💸",
            "Refund processed",
            format!(
                "Your refund of {} has been processed. Please allow 5-10 business days for it to appear.",
                amount
            ),
        ),
    };

    let body = format!(
        "<p>Hi {},</p><p>{}</p><p>Refund reference: <strong>{}</strong><br>Order: {}</p>{}",
        escape_html(&refund.customer_name),
        message,
        escape_html(&refund.code),
        escape_html(&refund.order_code),
        button(&branding.account_url, "View your account")
    );

    EmailMessage {
        subject,
        html: layout(branding, icon, heading, &body),
    }
}

fn refund_message(notice: &RefundMessageNotice, branding: &Branding) -> EmailMessage {
    let refund = &notice.refund;
    let body = format!(
        "<p>Hi {},</p><p>You have a new message about refund <strong>{}</strong>:</p>\
         <blockquote>{}</blockquote>{}",
        escape_html(&refund.customer_name),
        escape_html(&refund.code),
        escape_html(&notice.message).replace('\n', "<br>"),
        button(&branding.account_url, "Reply in your account")
    );

    EmailMessage {
        subject: format!("New message about refund {}", refund.code),
        html: layout(branding, "💬", "New message from our team", &body),
    }
}

fn order_confirmation(order: &OrderSummary, branding: &Branding) -> EmailMessage {
    let body = format!(
        "<p>Hi {},</p><p>Thank you for your order! Here is your summary.</p>\
         <p>Order number: <strong>{}</strong></p>{}<p>Shipping to: {}</p>{}",
        escape_html(&order.customer_name),
        escape_html(&order.code),
        order_table(order),
        escape_html(&order.shipping_address),
        button(&branding.account_url, "View your order")
    );

    EmailMessage {
        subject: format!("Order confirmation {}", order.code),
        html: layout(branding, "🎉", "Thank you for your order", &body),
    }
}

fn welcome(notice: &WelcomeNotice, branding: &Branding) -> EmailMessage {
    let body = format!(
        "<p>Hi {},</p><p>Welcome to {}! Your account is ready.</p>{}",
        escape_html(&notice.customer_name),
        escape_html(&branding.store_name),
        button(&branding.account_url, "Go to your account")
    );

    EmailMessage {
        subject: format!("Welcome to {}", branding.store_name),
        html: layout(branding, "👋", "Welcome", &body),
    }
}

fn admin_new_order(order: &OrderSummary, branding: &Branding) -> EmailMessage {
    let phone = order
        .customer_phone
        .as_deref()
        .map(|phone| format!("<br>Phone: {}", escape_html(phone)))
        .unwrap_or_default();

    let body = format!(
        "<p>A new order has been placed.</p><p>Order: <strong>{}</strong><br>\
         Customer: {} &lt;{}&gt;{}<br>Placed: {}</p>{}<p>Ship to: {}</p>",
        escape_html(&order.code),
        escape_html(&order.customer_name),
        escape_html(&order.customer_email),
        phone,
        order.created_at.format("%Y-%m-%d %H:%M UTC"),
        order_table(order),
        escape_html(&order.shipping_address)
    );

    EmailMessage {
        subject: format!("New order {} - {}", order.code, money(order.total)),
        html: layout(branding, "🛒", "New order", &body),
    }
}

fn admin_new_refund(refund: &RefundSummary, branding: &Branding) -> EmailMessage {
    let body = format!(
        "<p>A customer has requested a refund.</p><p>Refund: <strong>{}</strong><br>\
         Order: {}<br>Customer: {} &lt;{}&gt;<br>Amount: {}</p><p>Reason:</p><blockquote>{}</blockquote>",
        escape_html(&refund.code),
        escape_html(&refund.order_code),
        escape_html(&refund.customer_name),
        escape_html(&refund.customer_email),
        money(refund.amount),
        escape_html(&refund.reason)
    );

    EmailMessage {
        subject: format!("New refund request {} for order {}", refund.code, refund.order_code),
        html: layout(branding, "↩️", "New refund request", &body),
    }
}

fn order_table(order: &OrderSummary) -> String {
    let mut rows = String::new();
    for item in &order.items {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td align=\"right\">{}</td></tr>",
            escape_html(&item.name),
            item.quantity,
            money(item.line_total())
        ));
    }

    rows.push_str(&format!(
        "<tr><td colspan=\"2\">Subtotal</td><td align=\"right\">{}</td></tr>",
        money(order.subtotal)
    ));

    if let Some(code) = order.promo_code.as_deref() {
        rows.push_str(&format!(
            "<tr><td colspan=\"2\">Discount ({})</td><td align=\"right\">-{}</td></tr>",
            escape_html(code),
            money(order.promo_discount)
        ));
    }

    rows.push_str(&format!(
        "<tr><td colspan=\"2\">Shipping</td><td align=\"right\">{}</td></tr>\
         <tr><td colspan=\"2\"><strong>Total</strong></td><td align=\"right\"><strong>{}</strong></td></tr>",
        money(order.shipping_cost),
        money(order.total)
    ));

    format!("<table width=\"100%\" cellpadding=\"4\">{}</table>", rows)
}

fn layout(branding: &Branding, icon: &str, heading: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family: Helvetica, Arial, sans-serif; color: #333;\">\
         <div style=\"max-width: 600px; margin: 0 auto; padding: 24px;\">\
         <div style=\"font-size: 40px; text-align: center;\">{}</div>\
         <h1 style=\"text-align: center;\">{}</h1>{}\
         <hr><p style=\"font-size: 12px; color: #888; text-align: center;\">{}</p>\
         </div></body></html>",
        icon,
        heading,
        body,
        escape_html(&branding.store_name)
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        "<p style=\"text-align: center;\"><a href=\"{}\" style=\"background: #2f4f4f; color: #fff; \
         padding: 12px 24px; text-decoration: none; border-radius: 4px;\">{}</a></p>",
        escape_html(href),
        label
    )
}

fn money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Carrier, ShippingInfo};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn branding() -> Branding {
        Branding {
            store_name: "Driftwood & Bloom".to_string(),
            account_url: "https://shop.example.com/account".to_string(),
        }
    }

    fn summary() -> OrderSummary {
        OrderSummary {
            code: "DB-1001".to_string(),
            customer_name: "Jane Citizen".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_phone: None,
            items: vec![],
            subtotal: dec!(149.00),
            shipping_cost: dec!(9.95),
            promo_code: None,
            promo_discount: dec!(0),
            total: dec!(158.95),
            shipping_address: "1 George St, Sydney NSW 2000, Australia".to_string(),
            created_at: Utc::now(),
        }
    }

    fn refund_summary(status: RefundStatus) -> RefundSummary {
        RefundSummary {
            code: "RF-2002".to_string(),
            order_code: "DB-1001".to_string(),
            customer_name: "Jane Citizen".to_string(),
            customer_email: "jane@example.com".to_string(),
            amount: dec!(49.50),
            reason: "Arrived damaged".to_string(),
            status,
        }
    }

    #[test]
    fn test_shipped_email_has_tracking_button() {
        let event = NotificationEvent::OrderStatus(OrderStatusNotice::Shipped {
            order: summary(),
            shipping: Some(ShippingInfo {
                tracking_number: "AP123456789".to_string(),
                courier: Carrier::AustraliaPost,
                tracking_url: "https://auspost.com.au/mypost/track/#/details/AP123456789"
                    .to_string(),
                delivery_days: Some("3-5".to_string()),
            }),
        });

        let email = render(&event, &branding());
        assert_eq!(email.subject, "Your order DB-1001 is on its way");
        assert!(email.html.contains("AP123456789"));
        assert!(email.html.contains("Track your parcel"));
        assert!(email.html.contains("3-5 business days"));
    }

    #[test]
    fn test_shipped_email_without_url_omits_button() {
        let event = NotificationEvent::OrderStatus(OrderStatusNotice::Shipped {
            order: summary(),
            shipping: Some(ShippingInfo {
                tracking_number: "ZZ1".to_string(),
                courier: Carrier::Other,
                tracking_url: String::new(),
                delivery_days: None,
            }),
        });

        let email = render(&event, &branding());
        assert!(!email.html.contains("Track your parcel"));
        assert!(email.html.contains("Delivery times vary by location."));
    }

    #[test]
    fn test_every_refund_status_has_its_own_subject() {
        let statuses = [
            RefundStatus::Pending,
            RefundStatus::Reviewing,
            RefundStatus::Approved,
            RefundStatus::Denied,
            RefundStatus::Processed,
        ];

        let subjects: std::collections::HashSet<String> = statuses
            .iter()
            .map(|status| {
                let event = NotificationEvent::RefundStatus(RefundStatusNotice {
                    refund: refund_summary(*status),
                    status: *status,
                });
                render(&event, &branding()).subject
            })
            .collect();

        assert_eq!(subjects.len(), statuses.len());
    }

    #[test]
    fn test_refund_message_contains_text_and_link() {
        let event = NotificationEvent::RefundMessage(RefundMessageNotice {
            refund: refund_summary(RefundStatus::Approved),
            message: "Your refund will be issued to the original card".to_string(),
        });

        let email = render(&event, &branding());
        assert!(email.html.contains("Your refund will be issued to the original card"));
        assert!(email.html.contains("https://shop.example.com/account"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut order = summary();
        order.customer_name = "<script>alert(1)</script>".to_string();
        let email = render(&NotificationEvent::OrderConfirmation(order), &branding());
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_admin_new_order_subject_has_total() {
        let email = render(&NotificationEvent::AdminNewOrder(summary()), &branding());
        assert_eq!(email.subject, "New order DB-1001 - $158.95");
    }
}
