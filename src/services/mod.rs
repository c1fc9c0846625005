/*
 * Responsibility
 * - handshake authentication (auth)
 * - connection-scoped state and comment fan-out (realtime)
 */
pub mod auth;
pub mod realtime;
