//! Iced session-lock password prompt

use crate::descriptor::PromptSession;
use crate::error::{Error, Result};
use crate::PromptOutcome;
use iced::border::Radius;
use iced::event::{self, Status};
use iced::keyboard::{self, key::Named, Key};
use iced::theme::Palette;
use iced::widget::{column, container, horizontal_rule, row, text, text_input};
use iced::window::Id;
use iced::Color;
use iced::{Element, Event, Subscription, Task, Theme};
use iced_sessionlock::build_pattern::application;
use iced_sessionlock::to_session_message;
use std::sync::{Arc, Mutex};

/// Show the prompts of `session` and wait for the user to accept or cancel.
pub fn run(session: &PromptSession) -> Result<PromptOutcome> {
    let form = Form::from_session(session);
    let outcome = Arc::new(Mutex::new(PromptOutcome::Cancelled));
    let shared = Arc::clone(&outcome);

    application(App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .run_with(move || App::new(form.clone(), Arc::clone(&shared)))
        .map_err(|e| Error::Ui(format!("{e:?}")))?;

    let outcome = outcome
        .lock()
        .map_err(|_| Error::Ui("prompt state lock poisoned".into()))?
        .clone();
    Ok(outcome)
}

#[derive(Debug, Clone)]
struct Field {
    label: String,
    value: String,
}

#[derive(Debug, Clone)]
struct Form {
    title: String,
    description: String,
    fields: Vec<Field>,
}

impl Form {
    fn from_session(session: &PromptSession) -> Self {
        Self {
            title: session.title().to_owned(),
            description: session.description().to_owned(),
            fields: session
                .prompts()
                .iter()
                .map(|p| Field {
                    label: p.label.clone(),
                    value: p.value.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

struct App {
    form: Form,
    /// One per field, in slot order.
    input_ids: Vec<text_input::Id>,
    outcome: Arc<Mutex<PromptOutcome>>,
}

#[to_session_message]
#[derive(Debug, Clone)]
enum Message {
    Event(Event),
    Input(usize, String),
    Submit,
    Cancel,
}

impl App {
    fn new(form: Form, outcome: Arc<Mutex<PromptOutcome>>) -> (Self, Task<Message>) {
        let input_ids: Vec<_> = form.fields.iter().map(|_| text_input::Id::unique()).collect();
        let focus = match input_ids.first() {
            Some(id) => text_input::focus(id.clone()),
            None => Task::none(),
        };
        (
            Self {
                form,
                input_ids,
                outcome,
            },
            focus,
        )
    }

    fn theme(_: &Self) -> Theme {
        prompt_theme()
    }

    fn subscription(_: &Self) -> Subscription<Message> {
        // A focused input swallows Escape, so it is matched before the
        // capture status is looked at.
        event::listen_with(|event, status, _window| {
            if let Event::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(Named::Escape),
                ..
            }) = event
            {
                return Some(Message::Cancel);
            }
            (status == Status::Ignored).then_some(Message::Event(event))
        })
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Input(slot, value) => {
                if let Some(field) = self.form.fields.get_mut(slot) {
                    field.value = value;
                }
                Task::none()
            }
            Message::Submit => self.accept(),
            Message::Cancel => self.finish(PromptOutcome::Cancelled),
            Message::Event(Event::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(Named::Enter),
                ..
            })) => self.accept(),
            _ => Task::none(),
        }
    }

    fn accept(&mut self) -> Task<Message> {
        let values = self.form.fields.iter().map(|f| f.value.clone()).collect();
        self.finish(PromptOutcome::Accepted(values))
    }

    fn finish(&mut self, outcome: PromptOutcome) -> Task<Message> {
        if let Ok(mut shared) = self.outcome.lock() {
            *shared = outcome;
        }
        Task::done(Message::UnLock)
    }

    fn view(&self, _id: Id) -> Element<'_, Message> {
        let theme = prompt_theme();

        let mut content_items: Vec<Element<'_, Message>> = vec![
            text(&self.form.title).size(40).into(),
            horizontal_rule(1).into(),
            text(&self.form.description).size(24).into(),
        ];

        for (slot, (field, id)) in self.form.fields.iter().zip(&self.input_ids).enumerate() {
            content_items.push(text(&field.label).size(20).into());
            content_items.push(
                text_input("", &field.value)
                    .id(id.clone())
                    .secure(true)
                    .on_input(move |value| Message::Input(slot, value))
                    .on_submit(Message::Submit)
                    .padding(10)
                    .size(24)
                    .into(),
            );
        }

        let actions = row![
            text("[Enter] Unlock").size(24).color(theme.palette().success),
            text("[Esc] Cancel").size(24).color(theme.palette().danger),
        ]
        .spacing(30);
        content_items.push(actions.into());

        let content = column(content_items).spacing(16).padding(30).max_width(640);

        container(content)
            .center_x(iced::Length::Fill)
            .center_y(iced::Length::Fill)
            .style(|_theme| container::Style {
                background: Some(Color::from_rgba(0.04, 0.05, 0.07, 0.95).into()),
                border: iced::Border {
                    color: Color::from_rgb8(0x4C, 0x56, 0x6A),
                    width: 2.0,
                    radius: Radius::from(12.0),
                },
                ..Default::default()
            })
            .into()
    }
}

fn prompt_theme() -> Theme {
    Theme::custom(
        "Novpn Prompt".to_string(),
        Palette {
            background: Color::from_rgb8(0x0F, 0x11, 0x17),
            text: Color::from_rgb8(0xD8, 0xDE, 0xE9),
            primary: Color::from_rgb8(0x88, 0xC0, 0xD0),
            success: Color::from_rgb8(0xA3, 0xBE, 0x8C),
            danger: Color::from_rgb8(0xBF, 0x61, 0x6A),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let session = PromptSession::from_data(
            "[VPN Plugin UI]\nVersion=2\nDescription=D\nTitle=T\n\n\
             [password]\nLabel=Password\nValue=old\nIsSecret=true\nShouldAsk=true\n\n\
             [otp]\nLabel=Code\nIsSecret=true\nShouldAsk=true\n",
        )
        .unwrap();
        let outcome = Arc::new(Mutex::new(PromptOutcome::Cancelled));
        App::new(Form::from_session(&session), outcome).0
    }

    fn outcome(app: &App) -> PromptOutcome {
        app.outcome.lock().unwrap().clone()
    }

    #[test]
    fn every_field_gets_its_own_input() {
        let app = app();
        assert_eq!(app.input_ids.len(), 2);
        assert_ne!(app.input_ids[0], app.input_ids[1]);
        assert_eq!(app.form.fields[0].value, "old");
        assert_eq!(app.form.fields[1].label, "Code");
    }

    #[test]
    fn submit_reports_edited_values_in_slot_order() {
        let mut app = app();
        let _ = app.update(Message::Input(1, "123456".into()));
        let _ = app.update(Message::Submit);
        assert_eq!(
            outcome(&app),
            PromptOutcome::Accepted(vec!["old".into(), "123456".into()])
        );
    }

    #[test]
    fn cancel_discards_input() {
        let mut app = app();
        let _ = app.update(Message::Input(0, "typed".into()));
        let _ = app.update(Message::Cancel);
        assert_eq!(outcome(&app), PromptOutcome::Cancelled);
    }
}
