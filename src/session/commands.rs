//! `Amf0Command` dispatch (§4.7) — `connect`, `createStream`, `FCPublish`,
//! `publish`, and the catch-all bare `_result` reply every other command name
//! (including `releaseStream`) gets.

use super::{Session, SEND_CHUNK_SIZE};
use crate::amf::{Amf0Object, Amf0Value};
use crate::message::{Amf0Command, TypedMessage};
use crate::{Error, Result};

impl Session {
    pub(super) fn handle_command(&mut self, cmd: &Amf0Command, publish_stream_id: u32) -> Result<Vec<TypedMessage>> {
        match cmd.name.as_str() {
            "connect" => self.handle_connect(cmd),
            "createStream" => Ok(self.handle_create_stream(cmd)),
            "FCPublish" => Ok(self.handle_fc_publish(cmd)),
            "publish" => self.handle_publish(cmd, publish_stream_id),
            other => {
                log::debug!("command {} gets a bare _result reply", other);
                Ok(vec![result_reply(cmd.transaction_id, None, Vec::new())])
            }
        }
    }

    fn handle_connect(&mut self, cmd: &Amf0Command) -> Result<Vec<TypedMessage>> {
        let obj = cmd.command_object.as_ref().and_then(|v| v.as_object());
        let string_field = |key: &str| obj.and_then(|o| o.get(key)).and_then(|v| v.as_str()).map(str::to_string);

        self.tc_url = string_field("tcUrl");
        self.swf_url = string_field("swfUrl");
        self.flash_ver = string_field("flashVer");

        let mut command_object = Amf0Object::new();
        command_object.insert("rtmpVer", Amf0Value::string("RTMP/1.0"));
        command_object.insert("capabilities", Amf0Value::number(255.0));
        command_object.insert("mode", Amf0Value::number(1.0));

        let mut info = Amf0Object::new();
        info.insert("level", Amf0Value::string("status"));
        info.insert("code", Amf0Value::string("NetConnection.Connect.Success"));
        info.insert("description", Amf0Value::string("Connection succeeded."));
        info.insert("objectEncoding", Amf0Value::number(0.0));

        Ok(vec![
            TypedMessage::AckWindowSize(self.window_size),
            TypedMessage::SetPeerBandwidth(2_500_000, 2),
            TypedMessage::SetChunkSize(SEND_CHUNK_SIZE as u32),
            result_reply(cmd.transaction_id, Some(Amf0Value::Object(command_object)), vec![Amf0Value::Object(info)]),
            Amf0Command::new("onBWDone", 0).into(),
        ])
    }

    fn handle_create_stream(&mut self, cmd: &Amf0Command) -> Vec<TypedMessage> {
        self.create_stream_count += 1;
        vec![result_reply(
            cmd.transaction_id,
            None,
            vec![Amf0Value::number(self.create_stream_count as f64)],
        )]
    }

    fn handle_fc_publish(&mut self, cmd: &Amf0Command) -> Vec<TypedMessage> {
        let stream_name = cmd.extras.iter().find_map(|v| v.as_str()).unwrap_or_default();

        let mut info = Amf0Object::new();
        info.insert("code", Amf0Value::string("NetStream.Publish.Start"));
        info.insert("description", Amf0Value::string(stream_name));

        vec![
            Amf0Command::new("onFCPublish", 0).with_extra(Amf0Value::Object(info)).into(),
            result_reply(cmd.transaction_id, None, Vec::new()),
        ]
    }

    fn handle_publish(&mut self, cmd: &Amf0Command, publish_stream_id: u32) -> Result<Vec<TypedMessage>> {
        let name = cmd
            .extras
            .first()
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::command("publish: missing publishing name"))?
            .to_string();
        let kind = cmd
            .extras
            .get(1)
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::command("publish: missing publishing type"))?;
        if kind.to_lowercase() != "live" {
            return Err(Error::command(format!("publish: only \"live\" is supported, got \"{}\"", kind)));
        }

        let idx = self.stream_index(publish_stream_id);
        self.streams[idx].stream_name = name.clone();

        let mut info = Amf0Object::new();
        info.insert("level", Amf0Value::string("status"));
        info.insert("code", Amf0Value::string("NetStream.Publish.Start"));
        info.insert("description", Amf0Value::string(format!("publishing {}", name)));

        Ok(vec![Amf0Command::new("onStatus", 0).with_extra(Amf0Value::Object(info)).into()])
    }
}

fn result_reply(transaction_id: i32, command_object: Option<Amf0Value>, extras: Vec<Amf0Value>) -> TypedMessage {
    let mut cmd = Amf0Command::new("_result", transaction_id);
    cmd.command_object = command_object;
    cmd.extras = extras;
    cmd.into()
}

impl From<Amf0Command> for TypedMessage {
    fn from(cmd: Amf0Command) -> Self {
        TypedMessage::Amf0Command(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::{decode_all, encode_values, Amf0Object, Amf0Value};
    use crate::handshake::{SERVER_VERSION, VERSION};
    use crate::session::Session;

    fn fmt0_chunk(csid: u8, type_id: u8, stream_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut b = vec![csid, 0, 0, 0];
        let len = payload.len() as u32;
        b.extend_from_slice(&len.to_be_bytes()[1..]);
        b.push(type_id);
        b.extend_from_slice(&stream_id.to_le_bytes());
        b.extend_from_slice(payload);
        b
    }

    fn command_payload(name: &str, txn: f64, command_object: Amf0Value, extras: Vec<Amf0Value>) -> Vec<u8> {
        let mut values = vec![Amf0Value::String(name.to_string()), Amf0Value::Number(txn), command_object];
        values.extend(extras);
        encode_values(&values).unwrap()
    }

    fn run_handshake(session: &mut Session) {
        let mut c0c1 = vec![VERSION];
        c0c1.extend(std::iter::repeat(0u8).take(1536));
        session.on_bytes(&c0c1).unwrap();
        let mut c2 = SERVER_VERSION.to_vec();
        c2.extend(std::iter::repeat(0u8).take(1536 - 4));
        session.on_bytes(&c2).unwrap();
    }

    /// Scenario 4: connect, createStream, publish("cam", "live") yields
    /// exactly one onStatus with NetStream.Publish.Start.
    #[test]
    fn publish_happy_path_yields_single_onstatus() {
        let mut session = Session::new(|_meta, _ev| Ok(()), |_meta, _err| {});
        run_handshake(&mut session);

        let mut app = Amf0Object::new();
        app.insert("app", Amf0Value::string("live"));
        app.insert("tcUrl", Amf0Value::string("rtmp://h/live"));
        let connect = command_payload("connect", 1.0, Amf0Value::Object(app), vec![]);
        session.on_bytes(&fmt0_chunk(3, 20, 0, &connect)).unwrap();

        let create_stream = command_payload("createStream", 2.0, Amf0Value::Null, vec![]);
        let (_, reply) = session.on_bytes(&fmt0_chunk(3, 20, 0, &create_stream)).unwrap();
        let values = decode_all(&reply[12..]).unwrap();
        let stream_id = values[3].as_number().unwrap();
        assert_eq!(stream_id, 1.0);

        let publish = command_payload(
            "publish",
            0.0,
            Amf0Value::Null,
            vec![Amf0Value::string("cam"), Amf0Value::string("live")],
        );
        let (_, reply) = session.on_bytes(&fmt0_chunk(3, 20, stream_id as u32, &publish)).unwrap();

        let values = decode_all(&reply[12..]).unwrap();
        assert_eq!(values[0], Amf0Value::String("onStatus".to_string()));
        let info = values[2].as_object().unwrap();
        assert_eq!(info.get("code").and_then(|v| v.as_str()), Some("NetStream.Publish.Start"));
        assert_eq!(info.get("description").and_then(|v| v.as_str()), Some("publishing cam"));
    }

    #[test]
    fn publish_non_live_terminates_session_with_descriptive_error() {
        let mut session = Session::new(|_meta, _ev| Ok(()), |_meta, _err| {});
        run_handshake(&mut session);
        let payload = command_payload(
            "publish",
            0.0,
            Amf0Value::Null,
            vec![Amf0Value::string("x"), Amf0Value::string("record")],
        );
        let err = session.on_bytes(&fmt0_chunk(3, 20, 1, &payload)).unwrap_err();
        assert!(err.to_string().contains("live"));
    }

    #[test]
    fn unrecognized_command_gets_bare_result_reply() {
        let mut session = Session::new(|_meta, _ev| Ok(()), |_meta, _err| {});
        run_handshake(&mut session);
        let payload = command_payload("releaseStream", 3.0, Amf0Value::Null, vec![Amf0Value::string("cam")]);
        let (_, reply) = session.on_bytes(&fmt0_chunk(3, 20, 0, &payload)).unwrap();
        let values = decode_all(&reply[12..]).unwrap();
        assert_eq!(values[0], Amf0Value::String("_result".to_string()));
    }
}
