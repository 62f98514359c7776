use crate::gui::{Message, Notice, TutorApp};
use iced::font::Weight;
use iced::widget::{button, column, container, row, scrollable, text, text_input, Column, Space};
use iced::{Element, Font, Length};

const BOLD: Font = Font {
    weight: Weight::Bold,
    ..Font::DEFAULT
};

pub fn view(app: &TutorApp) -> Element<'_, Message> {
    let idle = !app.busy();

    let question = text_input("💭 Ask your question:", &app.input)
        .on_input(Message::InputChanged)
        .on_submit(Message::SendPressed)
        .padding(10)
        .size(18);

    let buttons = row![
        button(text("💬 Send Message"))
            .padding(10)
            .style(button::primary)
            .on_press_maybe(idle.then_some(Message::SendPressed)),
        button(text("🎙️ Speak Now"))
            .padding(10)
            .style(button::success)
            .on_press_maybe(idle.then_some(Message::SpeakPressed)),
        button(text("🔇 Stop Voice"))
            .padding(10)
            .style(button::danger)
            .on_press(Message::StopVoicePressed),
        button(text("🧹 Clear Memory"))
            .padding(10)
            .style(button::secondary)
            .on_press_maybe(idle.then_some(Message::ClearMemoryPressed)),
    ]
    .spacing(10);

    let notice: Element<Message> = match &app.notice {
        Some(notice @ Notice::Success(_)) => text(notice.text()).style(text::success).into(),
        Some(notice @ Notice::Error(_)) => text(notice.text()).style(text::danger).into(),
        Some(notice @ Notice::Warning(_)) => text(notice.text()).style(text::primary).into(),
        Some(notice @ Notice::Info(_)) => text(notice.text()).style(text::secondary).into(),
        None => Space::with_height(0).into(),
    };

    let status = match (app.speaking, app.tutor_online) {
        (true, _) => text("🔊 Speaking...").style(text::success),
        (false, Some(false)) => text("⚠️ Tutor service unreachable").style(text::danger),
        _ => text("").style(text::secondary),
    };

    let history: Element<Message> = if app.controller.conversation().is_empty() {
        container(text("Ask a question to start the conversation...").style(text::secondary))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    } else {
        let items: Vec<Element<Message>> = app
            .controller
            .recent_turns(app.history_limit)
            .map(|turn| {
                row![
                    text(format!("{}:", turn.speaker)).font(BOLD).size(16),
                    text(&turn.text).size(16)
                ]
                .spacing(8)
                .into()
            })
            .collect();

        scrollable(Column::with_children(items).spacing(10)).into()
    };

    column![
        text("🧠 Personalized AI Learning Tutor").size(36),
        text("Ask by typing or speaking; answers are read aloud.")
            .size(16)
            .style(text::secondary),
        Space::with_height(10),
        question,
        buttons,
        notice,
        status,
        Space::with_height(10),
        text("🗨️ Conversation History").size(22),
        container(history)
            .padding(10)
            .style(container::rounded_box)
            .width(Length::Fill)
            .height(Length::Fill)
    ]
    .spacing(12)
    .padding(20)
    .into()
}
