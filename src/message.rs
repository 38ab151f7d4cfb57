//! Composite messages: plain text interleaved with typed attachments,
//! compiled to the wire format's text/attachment split.

use std::borrow::Cow;
use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// The single reserved code point GroupMe substitutes for each emoji in
/// the rendered message text.
pub const EMOJI_PLACEHOLDER: char = '\u{FFFD}';

/// One unit of non-text content placed at a specific position in a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageAttach {
    /// References a user; `display` is the text shown inline (empty means
    /// an invisible mention).
    Mention { user_id: String, display: String },
    Image { url: String },
    Location { name: String, lat: f64, long: f64 },
    /// Legacy split-payment token. The feature is gone but the API still
    /// accepts the attachment.
    Split { token: String },
    Emoji { pack_id: u32, emoji_id: u32 },
    /// Undocumented: hands the url to a named server-side processing queue.
    Queued { url: String, queue: String },
}

impl MessageAttach {
    pub fn mention(user_id: impl Into<String>) -> Self {
        Self::Mention {
            user_id: user_id.into(),
            display: String::new(),
        }
    }

    pub fn mention_with_display(user_id: impl Into<String>, display: impl Into<String>) -> Self {
        Self::Mention {
            user_id: user_id.into(),
            display: display.into(),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::Image { url: url.into() }
    }

    pub fn location(name: impl Into<String>, lat: f64, long: f64) -> Self {
        Self::Location {
            name: name.into(),
            lat,
            long,
        }
    }

    pub fn split(token: impl Into<String>) -> Self {
        Self::Split {
            token: token.into(),
        }
    }

    pub fn emoji(pack_id: u32, emoji_id: u32) -> Self {
        Self::Emoji { pack_id, emoji_id }
    }

    pub fn queued(url: impl Into<String>, queue: impl Into<String>) -> Self {
        Self::Queued {
            url: url.into(),
            queue: queue.into(),
        }
    }

    /// A `Queued` attachment on the `linked_image` queue.
    pub fn linked_image(url: impl Into<String>) -> Self {
        Self::queued(url, "linked_image")
    }

    /// What this attachment contributes to the flattened message text.
    fn rendered(&self) -> Cow<'_, str> {
        match self {
            Self::Mention { display, .. } => Cow::Borrowed(display.as_str()),
            Self::Image { .. } => Cow::Borrowed(""),
            Self::Location { name, .. } => Cow::Borrowed(name.as_str()),
            Self::Split { token } => Cow::Borrowed(token.as_str()),
            Self::Emoji { .. } => Cow::Owned(EMOJI_PLACEHOLDER.to_string()),
            Self::Queued { url, .. } => Cow::Borrowed(url.as_str()),
        }
    }
}

impl fmt::Display for MessageAttach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered())
    }
}

/// Wire-format attachment descriptor, tagged on the `type` field exactly
/// as the v3 API serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    Mentions {
        user_ids: Vec<String>,
        /// `[offset, length]` pairs into the message text, counted in
        /// Unicode scalar values.
        loci: Vec<[u32; 2]>,
    },
    Image {
        url: String,
    },
    Location {
        name: String,
        lat: f64,
        long: f64,
    },
    Split {
        token: String,
    },
    Emoji {
        placeholder: String,
        charmap: Vec<[u32; 2]>,
    },
    Postprocessing {
        queues: Vec<String>,
    },
}

/// One element of a composite message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    Text(String),
    Attach(MessageAttach),
}

impl MessagePart {
    fn rendered(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text.as_str()),
            Self::Attach(attach) => attach.rendered(),
        }
    }
}

impl From<&str> for MessagePart {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessagePart {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<MessageAttach> for MessagePart {
    fn from(attach: MessageAttach) -> Self {
        Self::Attach(attach)
    }
}

/// An ordered sequence of text and attachment parts forming one rich
/// message. Built by concatenation (`+` works with strings and attachments
/// on either side), consumed by [`ComplexMessage::compile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexMessage {
    parts: Vec<MessagePart>,
}

impl ComplexMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: Vec<MessagePart>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[MessagePart] {
        &self.parts
    }

    pub fn push(&mut self, part: impl Into<MessagePart>) {
        self.parts.push(part.into());
    }

    pub fn push_front(&mut self, part: impl Into<MessagePart>) {
        self.parts.insert(0, part.into());
    }

    /// Splices `other`'s parts onto the end; `other` is consumed, so no
    /// part is ever shared between two live composites.
    pub fn append(&mut self, mut other: ComplexMessage) {
        self.parts.append(&mut other.parts);
    }

    pub fn prepend(&mut self, mut other: ComplexMessage) {
        other.parts.append(&mut self.parts);
        self.parts = other.parts;
    }

    /// The flattened message text: every part's rendering, in order.
    pub fn text(&self) -> String {
        self.parts.iter().map(|part| part.rendered()).collect()
    }

    /// Only the plain-text parts, attachment renderings excluded.
    pub fn just_str(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text(text) => Some(text.as_str()),
                MessagePart::Attach(_) => None,
            })
            .collect()
    }

    /// Flattens the message into its wire form: the rendered text and the
    /// attachment descriptor list.
    ///
    /// Descriptors appear in first-seen order. Mentions, emoji, and queued
    /// attachments share a single descriptor each, inserted at the position
    /// of their first occurrence; images, locations, and splits get one
    /// descriptor per part. Offsets count Unicode scalar values.
    pub fn compile(&self) -> (String, Vec<Attachment>) {
        let mut text = String::new();
        let mut offset: u32 = 0;
        let mut attachments: Vec<Attachment> = Vec::new();
        let mut mentions_slot: Option<usize> = None;
        let mut emoji_slot: Option<usize> = None;
        let mut queued_slot: Option<usize> = None;

        for part in &self.parts {
            if let MessagePart::Attach(attach) = part {
                match attach {
                    MessageAttach::Mention { user_id, display } => {
                        let slot = *mentions_slot.get_or_insert_with(|| {
                            attachments.push(Attachment::Mentions {
                                user_ids: Vec::new(),
                                loci: Vec::new(),
                            });
                            attachments.len() - 1
                        });
                        if let Attachment::Mentions { user_ids, loci } = &mut attachments[slot] {
                            user_ids.push(user_id.clone());
                            loci.push([offset, display.chars().count() as u32]);
                        }
                    }
                    MessageAttach::Image { url } => {
                        attachments.push(Attachment::Image { url: url.clone() });
                    }
                    MessageAttach::Location { name, lat, long } => {
                        attachments.push(Attachment::Location {
                            name: name.clone(),
                            lat: *lat,
                            long: *long,
                        });
                    }
                    MessageAttach::Split { token } => {
                        attachments.push(Attachment::Split {
                            token: token.clone(),
                        });
                    }
                    MessageAttach::Emoji { pack_id, emoji_id } => {
                        let slot = *emoji_slot.get_or_insert_with(|| {
                            attachments.push(Attachment::Emoji {
                                placeholder: EMOJI_PLACEHOLDER.to_string(),
                                charmap: Vec::new(),
                            });
                            attachments.len() - 1
                        });
                        if let Attachment::Emoji { charmap, .. } = &mut attachments[slot] {
                            charmap.push([*pack_id, *emoji_id]);
                        }
                    }
                    MessageAttach::Queued { queue, .. } => {
                        let slot = *queued_slot.get_or_insert_with(|| {
                            attachments.push(Attachment::Postprocessing { queues: Vec::new() });
                            attachments.len() - 1
                        });
                        if let Attachment::Postprocessing { queues } = &mut attachments[slot] {
                            if !queues.contains(queue) {
                                queues.push(queue.clone());
                            }
                        }
                    }
                }
            }

            let rendered = part.rendered();
            offset += rendered.chars().count() as u32;
            text.push_str(&rendered);
        }

        (text, attachments)
    }

    /// The attachment descriptor list alone; see [`ComplexMessage::compile`].
    pub fn attachments(&self) -> Vec<Attachment> {
        self.compile().1
    }

    /// Reconstructs a composite message from received wire data: the exact
    /// inverse of [`ComplexMessage::compile`] for mentions.
    ///
    /// A `Mention` part is spliced in at each locus of the `mentions`
    /// descriptor, covering `text[offset..offset + length]`, with plain
    /// text runs in between. Without a `mentions` descriptor the whole
    /// text becomes a single plain part.
    pub fn decompile(text: &str, attachments: &[Attachment]) -> ComplexMessage {
        let mentions = attachments.iter().find_map(|attachment| match attachment {
            Attachment::Mentions { user_ids, loci } => Some((user_ids, loci)),
            _ => None,
        });
        let Some((user_ids, loci)) = mentions else {
            return ComplexMessage::from(text);
        };

        let chars: Vec<char> = text.chars().collect();
        let mut spans: Vec<(usize, usize, &str)> = loci
            .iter()
            .zip(user_ids)
            .map(|(locus, user_id)| (locus[0] as usize, locus[1] as usize, user_id.as_str()))
            .collect();
        spans.sort_by_key(|span| span.0);

        let mut message = ComplexMessage::new();
        let mut cursor = 0;
        for (offset, length, user_id) in spans {
            let offset = offset.min(chars.len());
            let end = (offset + length).min(chars.len());
            if offset > cursor {
                message.push(chars[cursor..offset].iter().collect::<String>());
            }
            let display: String = chars[offset..end].iter().collect();
            message.push(MessageAttach::mention_with_display(user_id, display));
            cursor = end;
        }
        if cursor < chars.len() {
            message.push(chars[cursor..].iter().collect::<String>());
        }
        message
    }
}

impl From<&str> for ComplexMessage {
    fn from(text: &str) -> Self {
        Self {
            parts: vec![text.into()],
        }
    }
}

impl From<String> for ComplexMessage {
    fn from(text: String) -> Self {
        Self {
            parts: vec![text.into()],
        }
    }
}

impl From<MessageAttach> for ComplexMessage {
    fn from(attach: MessageAttach) -> Self {
        Self {
            parts: vec![attach.into()],
        }
    }
}

// `+` in either argument position builds the same left-to-right part
// order; association direction never changes the compiled output.

impl<R: Into<ComplexMessage>> Add<R> for ComplexMessage {
    type Output = ComplexMessage;

    fn add(mut self, rhs: R) -> ComplexMessage {
        self.append(rhs.into());
        self
    }
}

impl<R: Into<ComplexMessage>> Add<R> for MessageAttach {
    type Output = ComplexMessage;

    fn add(self, rhs: R) -> ComplexMessage {
        ComplexMessage::from(self) + rhs
    }
}

impl Add<MessageAttach> for &str {
    type Output = ComplexMessage;

    fn add(self, rhs: MessageAttach) -> ComplexMessage {
        ComplexMessage::from(self) + rhs
    }
}

impl Add<ComplexMessage> for &str {
    type Output = ComplexMessage;

    fn add(self, rhs: ComplexMessage) -> ComplexMessage {
        ComplexMessage::from(self) + rhs
    }
}

impl Add<MessageAttach> for String {
    type Output = ComplexMessage;

    fn add(self, rhs: MessageAttach) -> ComplexMessage {
        ComplexMessage::from(self) + rhs
    }
}

impl Add<ComplexMessage> for String {
    type Output = ComplexMessage;

    fn add(self, rhs: ComplexMessage) -> ComplexMessage {
        ComplexMessage::from(self) + rhs
    }
}

/// Anything the client will accept as an outgoing message body.
#[derive(Debug, Clone)]
pub enum OutgoingMessage {
    Text(String),
    Complex(ComplexMessage),
}

impl From<&str> for OutgoingMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for OutgoingMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ComplexMessage> for OutgoingMessage {
    fn from(message: ComplexMessage) -> Self {
        Self::Complex(message)
    }
}

impl From<MessageAttach> for OutgoingMessage {
    fn from(attach: MessageAttach) -> Self {
        Self::Complex(attach.into())
    }
}

/// Splits an outgoing message into the `(text, attachments)` pair the API
/// expects. Plain strings pass through with no attachments; composite
/// messages are compiled.
pub fn smart_split(message: impl Into<OutgoingMessage>) -> (String, Vec<Attachment>) {
    match message.into() {
        OutgoingMessage::Text(text) => (text, Vec::new()),
        OutgoingMessage::Complex(message) => message.compile(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mentions(user_ids: &[&str], loci: &[[u32; 2]]) -> Attachment {
        Attachment::Mentions {
            user_ids: user_ids.iter().map(|id| id.to_string()).collect(),
            loci: loci.to_vec(),
        }
    }

    #[test]
    fn test_manual_creation() {
        let message = ComplexMessage::from_parts(vec![
            "Hello, ".into(),
            MessageAttach::mention_with_display("user_id_here", "@world").into(),
        ]);

        let (text, attachments) = message.compile();
        assert_eq!(text, "Hello, @world");
        assert_eq!(attachments, vec![mentions(&["user_id_here"], &[[7, 6]])]);
    }

    #[test]
    fn test_dynamic_creation() {
        let message = "Hello, " + MessageAttach::mention_with_display("user_id_here", "@world");

        let (text, attachments) = message.compile();
        assert_eq!(text, "Hello, @world");
        assert_eq!(attachments, vec![mentions(&["user_id_here"], &[[7, 6]])]);
    }

    #[test]
    fn test_dynamic_creation_reverse_order() {
        let message = MessageAttach::mention_with_display("user_id_here", "@world") + " how are you?";

        let (text, attachments) = message.compile();
        assert_eq!(text, "@world how are you?");
        assert_eq!(attachments, vec![mentions(&["user_id_here"], &[[0, 6]])]);
    }

    #[test]
    fn test_hidden_mention() {
        let message = "Test" + MessageAttach::mention("user_id_here");

        let (text, attachments) = message.compile();
        assert_eq!(text, "Test");
        assert_eq!(attachments, vec![mentions(&["user_id_here"], &[[4, 0]])]);
    }

    #[test]
    fn test_visible_mention() {
        let message = "Test " + MessageAttach::mention_with_display("user_id_here", "@all");

        let (text, attachments) = message.compile();
        assert_eq!(text, "Test @all");
        assert_eq!(attachments, vec![mentions(&["user_id_here"], &[[5, 4]])]);
    }

    #[test]
    fn test_multiple_mentions_accumulate_offsets() {
        let message = "Test "
            + MessageAttach::mention_with_display("user1", "@1")
            + MessageAttach::mention_with_display("user2", "@2")
            + MessageAttach::mention_with_display("user3", "@3");

        let (text, attachments) = message.compile();
        assert_eq!(text, "Test @1@2@3");
        assert_eq!(
            attachments,
            vec![mentions(&["user1", "user2", "user3"], &[[5, 2], [7, 2], [9, 2]])]
        );
    }

    #[test]
    fn test_mentions_split_by_text() {
        let message = MessageAttach::mention_with_display("red_id", "@red")
            + " vs. "
            + MessageAttach::mention_with_display("blue_id", "@blue");

        let (text, attachments) = message.compile();
        assert_eq!(text, "@red vs. @blue");
        assert_eq!(
            attachments,
            vec![mentions(&["red_id", "blue_id"], &[[0, 4], [9, 5]])]
        );
    }

    #[test]
    fn test_mixed_attachments_first_seen_order() {
        let message = MessageAttach::mention("user1")
            + MessageAttach::image("http://image.url")
            + MessageAttach::location("home", 32.0, 83.0)
            + MessageAttach::split("token")
            + MessageAttach::emoji(13, 9);

        let (text, attachments) = message.compile();
        assert_eq!(text, format!("hometoken{}", EMOJI_PLACEHOLDER));
        assert_eq!(
            attachments,
            vec![
                mentions(&["user1"], &[[0, 0]]),
                Attachment::Image {
                    url: "http://image.url".to_string(),
                },
                Attachment::Location {
                    name: "home".to_string(),
                    lat: 32.0,
                    long: 83.0,
                },
                Attachment::Split {
                    token: "token".to_string(),
                },
                Attachment::Emoji {
                    placeholder: EMOJI_PLACEHOLDER.to_string(),
                    charmap: vec![[13, 9]],
                },
            ]
        );
    }

    #[test]
    fn test_image_order_independence() {
        let message1 = MessageAttach::image("image_url_here") + "Check out my cool image!";
        let message2 = "Check out my cool image!" + MessageAttach::image("image_url_here");

        assert_eq!(message1.text(), message2.text());
        assert_eq!(message1.attachments(), message2.attachments());
    }

    #[test]
    fn test_text_is_concatenation_of_rendered_parts() {
        let message = "a"
            + MessageAttach::mention_with_display("u", "@m")
            + MessageAttach::emoji(1, 2)
            + MessageAttach::split("tok")
            + "z";

        let expected: String = message.parts().iter().map(|part| part.rendered()).collect();
        assert_eq!(message.text(), expected);
        assert_eq!(message.compile().0, expected);
    }

    #[test]
    fn test_emoji_counts_as_one_character() {
        // The placeholder is multi-byte in UTF-8 but must advance the
        // mention offset by exactly one unit.
        let message = MessageAttach::emoji(3, 7) + MessageAttach::mention_with_display("u1", "@x");

        let (text, attachments) = message.compile();
        assert_eq!(text.chars().count(), 3);
        assert_eq!(
            attachments,
            vec![
                Attachment::Emoji {
                    placeholder: EMOJI_PLACEHOLDER.to_string(),
                    charmap: vec![[3, 7]],
                },
                mentions(&["u1"], &[[1, 2]]),
            ]
        );
    }

    #[test]
    fn test_offsets_count_scalar_values_not_bytes() {
        let message = "héllo ".to_string() + MessageAttach::mention_with_display("u1", "@wörld");

        let (text, attachments) = message.compile();
        assert_eq!(text, "héllo @wörld");
        assert_eq!(attachments, vec![mentions(&["u1"], &[[6, 6]])]);
    }

    #[test]
    fn test_queued_same_queue_merges() {
        let message = MessageAttach::queued("http://a.url", "processing")
            + MessageAttach::queued("http://b.url", "processing");

        let (text, attachments) = message.compile();
        assert_eq!(text, "http://a.urlhttp://b.url");
        assert_eq!(
            attachments,
            vec![Attachment::Postprocessing {
                queues: vec!["processing".to_string()],
            }]
        );
    }

    #[test]
    fn test_queued_distinct_queues_share_one_descriptor() {
        let message =
            MessageAttach::queued("http://a.url", "one") + MessageAttach::linked_image("http://b.url");

        let attachments = message.attachments();
        assert_eq!(
            attachments,
            vec![Attachment::Postprocessing {
                queues: vec!["one".to_string(), "linked_image".to_string()],
            }]
        );
    }

    #[test]
    fn test_just_str_skips_attachment_renderings() {
        let message = "a" + MessageAttach::split("tok") + "b";
        assert_eq!(message.just_str(), "ab");
        assert_eq!(message.text(), "atokb");
    }

    #[test]
    fn test_smart_split_complex_message() {
        let message = ComplexMessage::from_parts(vec![
            "Hello, ".into(),
            MessageAttach::mention_with_display("user_id_here", "@world").into(),
        ]);

        let (text, attachments) = smart_split(message);
        assert_eq!(text, "Hello, @world");
        assert_eq!(attachments, vec![mentions(&["user_id_here"], &[[7, 6]])]);
    }

    #[test]
    fn test_smart_split_plain_string() {
        let (text, attachments) = smart_split("Hello!");
        assert_eq!(text, "Hello!");
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_decompile_without_mentions_is_single_part() {
        let message = ComplexMessage::decompile("just text", &[]);
        assert_eq!(message.parts(), &[MessagePart::Text("just text".to_string())]);
    }

    #[test]
    fn test_decompile_splices_mentions() {
        let message =
            ComplexMessage::decompile("Hi @world, bye", &[mentions(&["u1"], &[[3, 6]])]);

        assert_eq!(
            message.parts(),
            &[
                MessagePart::Text("Hi ".to_string()),
                MessagePart::Attach(MessageAttach::mention_with_display("u1", "@world")),
                MessagePart::Text(", bye".to_string()),
            ]
        );
    }

    #[test]
    fn test_decompile_compile_round_trip() {
        let original = "Test "
            + MessageAttach::mention_with_display("user1", "@1")
            + MessageAttach::mention_with_display("user2", "@2")
            + " done";
        let (text, attachments) = original.compile();

        let rebuilt = ComplexMessage::decompile(&text, &attachments);
        assert_eq!(rebuilt.compile(), (text, attachments));
    }

    #[test]
    fn test_decompile_round_trip_hidden_trailing_mention() {
        let (text, attachments) = ("Test" + MessageAttach::mention("u1")).compile();
        let rebuilt = ComplexMessage::decompile(&text, &attachments);
        assert_eq!(rebuilt.compile(), (text, attachments));
    }

    #[test]
    fn test_attachment_wire_shapes() {
        let (_, attachments) = ("Hi "
            + MessageAttach::mention_with_display("u1", "@x")
            + MessageAttach::image("http://i.url")
            + MessageAttach::location("home", 32.0, 83.0)
            + MessageAttach::split("tok")
            + MessageAttach::emoji(1, 2)
            + MessageAttach::queued("http://q.url", "linked_image"))
        .compile();

        assert_eq!(
            serde_json::to_value(&attachments).unwrap(),
            json!([
                {"type": "mentions", "user_ids": ["u1"], "loci": [[3, 2]]},
                {"type": "image", "url": "http://i.url"},
                {"type": "location", "name": "home", "lat": 32.0, "long": 83.0},
                {"type": "split", "token": "tok"},
                {"type": "emoji", "placeholder": EMOJI_PLACEHOLDER.to_string(), "charmap": [[1, 2]]},
                {"type": "postprocessing", "queues": ["linked_image"]},
            ])
        );
    }

    #[test]
    fn test_attachment_parses_from_wire_json() {
        let parsed: Vec<Attachment> = serde_json::from_value(json!([
            {"type": "mentions", "user_ids": ["a", "b"], "loci": [[0, 2], [3, 2]]},
            {"type": "image", "url": "http://i.url"},
        ]))
        .unwrap();

        assert_eq!(
            parsed,
            vec![
                mentions(&["a", "b"], &[[0, 2], [3, 2]]),
                Attachment::Image {
                    url: "http://i.url".to_string(),
                },
            ]
        );
    }
}
