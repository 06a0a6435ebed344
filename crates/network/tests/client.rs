//! End-to-end client tests against an in-process fake server

use eoclient_core::{EoError, PlayerId};
use eoclient_network::{Client, ConnectionEvent, ConnectionState, FrameCodec, HandlerRegistry, NetworkConfig};
use eoclient_protocol::init::server_verification_hash;
use eoclient_protocol::{
    FamilyActionKey, InitReply, InventoryItem, LockerEvent, PacketAction, PacketEncoder, PacketFamily, PacketFrame,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::Framed;

const SEQ1: u32 = 10;
const SEQ2: u32 = 5;
/// 10 * 7 - 11 + 5 - 2
const SEQ_START: u32 = 62;
const DECODE: u8 = 6;
const ENCODE: u8 = 9;
const PLAYER: u16 = 321;

type Server = Framed<DuplexStream, FrameCodec>;

fn pair() -> (Client, DuplexStream, Server) {
    let config = NetworkConfig {
        connect_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let client = Client::new(config, Arc::new(HandlerRegistry::new()));
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    (client, client_io, Framed::new(server_io, FrameCodec::default()))
}

fn ok_reply(response: u32) -> PacketFrame {
    let mut frame = PacketFrame::new(PacketFamily::Init, PacketAction::Init);
    frame.add_byte(InitReply::Ok.as_u8() as u32).unwrap();
    frame.add_byte(SEQ1).unwrap();
    frame.add_byte(SEQ2).unwrap();
    frame.add_byte(DECODE as u32).unwrap();
    frame.add_byte(ENCODE as u32).unwrap();
    frame.add_short(PLAYER as u32).unwrap();
    frame.add_three(response).unwrap();
    frame
}

async fn recv(server: &mut Server) -> PacketFrame {
    tokio::time::timeout(Duration::from_secs(2), server.next())
        .await
        .expect("timed out waiting for client frame")
        .expect("client closed the stream")
        .expect("client frame did not decode")
}

/// Read the init request and answer it; returns the challenge
async fn answer_init(server: &mut Server, reply: impl FnOnce(u32) -> PacketFrame) -> u32 {
    let mut request = recv(server).await;
    assert_eq!(request.key(), FamilyActionKey::INIT);
    let challenge = request.get_three().unwrap();
    assert_eq!(request.get_byte().unwrap(), 0);
    assert_eq!(request.get_byte().unwrap(), 0);
    assert_eq!(request.get_byte().unwrap(), 28);

    server.send(reply(challenge)).await.unwrap();
    challenge
}

/// Full server side of a successful handshake
async fn serve_handshake(server: &mut Server) {
    answer_init(server, |challenge| ok_reply(server_verification_hash(challenge))).await;
    *server.codec().encoder().write() = Some(PacketEncoder::new(DECODE, ENCODE).mirrored());

    let mut accept = recv(server).await;
    assert_eq!(accept.family(), PacketFamily::Connection);
    assert_eq!(accept.action(), PacketAction::Accept);
    assert_eq!(accept.get_byte().unwrap(), SEQ_START + 1);
    assert_eq!(accept.get_short().unwrap(), DECODE as u32);
    assert_eq!(accept.get_short().unwrap(), ENCODE as u32);
    assert_eq!(accept.get_short().unwrap(), PLAYER as u32);
}

async fn connected() -> (Client, Server) {
    let (client, client_io, mut server) = pair();
    let (result, ()) = tokio::join!(client.connect_with_stream(client_io), serve_handshake(&mut server));
    result.unwrap();
    (client, server)
}

fn keep_alive(echo: u32, s1: u32, s2: u32) -> PacketFrame {
    let mut frame = PacketFrame::new(PacketFamily::Connection, PacketAction::Player);
    frame.add_short(echo).unwrap();
    frame.add_short(s1).unwrap();
    frame.add_byte(s2).unwrap();
    frame
}

async fn wait_for_loss(events: &mut broadcast::Receiver<ConnectionEvent>) -> String {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("timed out waiting for connection loss")
            .unwrap();
        if let ConnectionEvent::ConnectionLost(reason) = event {
            return reason;
        }
    }
}

#[tokio::test]
async fn test_handshake_initializes_session() {
    let (client, _server) = connected().await;

    assert_eq!(client.state(), ConnectionState::Initialized);
    assert_eq!(client.player_id(), Some(PlayerId::new(PLAYER)));
    let init = client.init_data().unwrap();
    assert_eq!((init.decode_multiple, init.encode_multiple), (DECODE, ENCODE));
}

#[tokio::test]
async fn test_keep_alive_reseeds_and_pings() {
    let (client, mut server) = connected().await;

    server.send(keep_alive(SEQ_START + 1, 300, 100)).await.unwrap();

    let mut ping = recv(&mut server).await;
    assert_eq!(ping.key(), FamilyActionKey::new(PacketFamily::Connection, PacketAction::Ping));
    // Re-seeded start is 300 - 100
    assert_eq!(ping.get_byte().unwrap(), 201);
    assert_eq!(ping.get_end_string().unwrap(), "k");

    client.buy_locker_upgrade().unwrap();
    let mut buy = recv(&mut server).await;
    assert_eq!(buy.key(), FamilyActionKey::new(PacketFamily::Locker, PacketAction::Buy));
    assert_eq!(buy.get_byte().unwrap(), 202);
    assert!(!buy.has_more_data());
}

#[tokio::test]
async fn test_locker_round_trip() {
    let (client, mut server) = connected().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    client.handlers().register_function(
        FamilyActionKey::new(PacketFamily::Locker, PacketAction::Open),
        move |frame| {
            let _ = tx.send(LockerEvent::translate(frame)?);
            Ok(())
        },
    );

    client.open_locker(3, 4).unwrap();
    let mut open = recv(&mut server).await;
    assert_eq!(open.key(), FamilyActionKey::new(PacketFamily::Locker, PacketAction::Open));
    assert_eq!(open.get_byte().unwrap(), SEQ_START + 2);
    assert_eq!(open.get_byte().unwrap(), 3);
    assert_eq!(open.get_byte().unwrap(), 4);

    let mut reply = PacketFrame::new(PacketFamily::Locker, PacketAction::Open);
    reply.add_byte(3).unwrap();
    reply.add_byte(4).unwrap();
    reply.add_short(1).unwrap();
    reply.add_three(50).unwrap();
    server.send(reply).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    match event {
        LockerEvent::Opened(opened) => {
            assert_eq!((opened.x, opened.y), (3, 4));
            assert_eq!(opened.items, vec![InventoryItem { id: 1, amount: 50 }]);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_desync_tears_down() {
    let (client, mut server) = connected().await;
    let mut events = client.subscribe();
    client.open_locker(1, 1).unwrap();
    recv(&mut server).await;

    server.send(keep_alive(999, 300, 100)).await.unwrap();

    let reason = wait_for_loss(&mut events).await;
    assert!(reason.contains("desync"), "unexpected reason: {}", reason);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.init_data().is_none());
    assert_eq!(client.queued(), 0);
    assert!(matches!(client.open_locker(1, 1), Err(EoError::NotInitialized)));
}

#[tokio::test]
async fn test_server_close_is_connection_lost() {
    let (client, server) = connected().await;
    let mut events = client.subscribe();

    drop(server);

    wait_for_loss(&mut events).await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_banned_fails_handshake() {
    let (client, client_io, mut server) = pair();

    let serve = answer_init(&mut server, |_| {
        let mut frame = PacketFrame::new(PacketFamily::Init, PacketAction::Init);
        frame.add_byte(InitReply::Banned.as_u8() as u32).unwrap();
        frame.add_byte(0).unwrap();
        frame.add_byte(30).unwrap();
        frame
    });
    let (result, _) = tokio::join!(client.connect_with_stream(client_io), serve);

    assert!(matches!(result, Err(EoError::Handshake(_))));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_bad_challenge_response_fails_handshake() {
    let (client, client_io, mut server) = pair();

    let serve = answer_init(&mut server, |challenge| ok_reply(server_verification_hash(challenge) + 1));
    let (result, _) = tokio::join!(client.connect_with_stream(client_io), serve);

    assert!(matches!(result, Err(EoError::Handshake(_))));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(matches!(client.buy_locker_upgrade(), Err(EoError::NotInitialized)));
}

#[tokio::test]
async fn test_disconnect_and_reconnect() {
    let (client, _server) = connected().await;

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let mut server = Framed::new(server_io, FrameCodec::default());
    let (result, ()) = tokio::join!(client.connect_with_stream(client_io), serve_handshake(&mut server));
    result.unwrap();
    assert_eq!(client.state(), ConnectionState::Initialized);
}
